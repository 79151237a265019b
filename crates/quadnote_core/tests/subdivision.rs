use quadnote_core::{child_keys, reset_cell, subdivide, CellKey, Matrix, MatrixError, Payload, Rgb};

const RED: u32 = 0xff0000;
const BLUE: u32 = 0x0000ff;

#[test]
fn subdivide_copies_color_to_all_children() {
    let mut matrix = Matrix::new(400, 3).expect("matrix");
    matrix.set_color(1, 2, RED).expect("paint parent");

    let children = subdivide(&mut matrix, 1, 2).expect("subdivide");

    // depth 1 index 2 is (0, 1); children cover (0..2, 2..4) at depth 2.
    assert_eq!(children.map(|key| key.index), [8, 9, 12, 13]);
    for child in children {
        assert_eq!(matrix.color(child.depth, child.index).expect("child"), RED);
    }
    assert_eq!(matrix.color(1, 2).expect("parent"), RED);
    assert_eq!(matrix.painted_counts(), vec![0, 1, 4, 0]);
}

#[test]
fn subdivide_overwrites_existing_children() {
    let mut matrix = Matrix::new(400, 1).expect("matrix");
    matrix.set_color(1, 3, BLUE).expect("paint child");

    subdivide(&mut matrix, 0, 0).expect("subdivide empty parent");

    assert_eq!(matrix.layers()[1].nodes, vec![0, 0, 0, 0]);
}

#[test]
fn subdivide_copies_independent_payloads() {
    let mut matrix = Matrix::new(400, 2).expect("matrix");
    let label = Payload::text("harbor", Rgb(20, 40, 60));
    matrix.set_payload(0, 0, label.clone()).expect("attach");

    let children = subdivide(&mut matrix, 0, 0).expect("subdivide");
    for child in children {
        assert_eq!(
            matrix.payload(child.depth, child.index).expect("child"),
            Some(&label)
        );
    }

    if let Some(Payload::Text { text, .. }) = matrix.payload_mut(1, 0).expect("child 0") {
        text.push_str(" north");
    }

    assert_eq!(
        matrix.payload(1, 0).expect("child 0"),
        Some(&Payload::text("harbor north", Rgb(20, 40, 60)))
    );
    assert_eq!(matrix.payload(0, 0).expect("parent"), Some(&label));
    assert_eq!(matrix.payload(1, 1).expect("sibling"), Some(&label));
}

#[test]
fn subdivide_without_payload_keeps_child_payloads() {
    let mut matrix = Matrix::new(400, 1).expect("matrix");
    let note = Payload::code("print('kept')", "python");
    matrix.set_payload(1, 2, note.clone()).expect("attach child");

    subdivide(&mut matrix, 0, 0).expect("subdivide");

    assert_eq!(matrix.payload(1, 2).expect("child"), Some(&note));
    assert_eq!(matrix.payload_pool().len(), 1);
}

#[test]
fn subdivide_replaces_child_payloads_when_parent_has_one() {
    let mut matrix = Matrix::new(400, 1).expect("matrix");
    matrix
        .set_payload(1, 2, Payload::code("print('old')", "python"))
        .expect("attach child");
    matrix
        .set_payload(0, 0, Payload::image(vec![7, 7, 7]))
        .expect("attach parent");

    subdivide(&mut matrix, 0, 0).expect("subdivide");

    assert_eq!(
        matrix.payload(1, 2).expect("child"),
        Some(&Payload::image(vec![7, 7, 7]))
    );
}

#[test]
fn subdivide_at_max_depth_fails_and_leaves_matrix_unchanged() {
    let mut matrix = Matrix::new(400, 2).expect("matrix");
    matrix.set_color(2, 5, RED).expect("paint");
    matrix
        .set_payload(2, 5, Payload::text("leaf", Rgb::BLACK))
        .expect("attach");
    let before = matrix.clone();

    let err = subdivide(&mut matrix, 2, 5).expect_err("max depth must fail");
    assert_eq!(
        err,
        MatrixError::DepthExceeded {
            depth: 2,
            max_depth: 2
        }
    );
    assert_eq!(matrix, before);
}

#[test]
fn subdivide_rejects_bad_index_without_changes() {
    let mut matrix = Matrix::new(400, 2).expect("matrix");
    let before = matrix.clone();

    let err = subdivide(&mut matrix, 1, 9).expect_err("bad index must fail");
    assert!(matches!(err, MatrixError::IndexOutOfRange { index: 9, .. }));
    assert_eq!(matrix, before);
}

#[test]
fn subdivide_does_not_recurse() {
    let mut matrix = Matrix::new(400, 3).expect("matrix");
    matrix.set_color(0, 0, RED).expect("paint root");

    subdivide(&mut matrix, 0, 0).expect("subdivide");

    assert_eq!(matrix.painted_counts(), vec![1, 4, 0, 0]);
}

#[test]
fn reset_cell_clears_only_target() {
    let mut matrix = Matrix::new(400, 2).expect("matrix");
    matrix.set_color(0, 0, RED).expect("paint root");
    matrix
        .set_payload(0, 0, Payload::text("root", Rgb::BLACK))
        .expect("attach root");
    subdivide(&mut matrix, 0, 0).expect("subdivide");
    matrix.set_color(1, 1, BLUE).expect("paint sibling");

    let removed = reset_cell(&mut matrix, 1, 0).expect("reset");

    assert_eq!(removed, Some(Payload::text("root", Rgb::BLACK)));
    assert_eq!(matrix.color(1, 0).expect("target"), 0);
    assert!(matrix.payload(1, 0).expect("target").is_none());
    assert_eq!(matrix.color(1, 1).expect("sibling"), BLUE);
    assert!(matrix.payload(1, 1).expect("sibling").is_some());
    assert_eq!(matrix.color(0, 0).expect("parent"), RED);
    assert!(matrix.payload(0, 0).expect("parent").is_some());
}

#[test]
fn reset_cell_is_bounds_checked() {
    let mut matrix = Matrix::new(400, 1).expect("matrix");
    let err = reset_cell(&mut matrix, 1, 4).expect_err("bad index must fail");
    assert!(matches!(err, MatrixError::IndexOutOfRange { .. }));
}

#[test]
fn child_keys_follow_spatial_layout() {
    let matrix = Matrix::new(400, 4).expect("matrix");

    // depth 3 index 27 is (3, 3); children at depth 4 start at (6, 6).
    let children = child_keys(&matrix, 3, 27).expect("children");
    assert_eq!(
        children,
        [
            CellKey::new(4, 102),
            CellKey::new(4, 103),
            CellKey::new(4, 118),
            CellKey::new(4, 119),
        ]
    );
}
