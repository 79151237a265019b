use quadnote_core::{
    ActionResponse, CellAction, CellKey, EditorSession, ExecutionOutcome, MatrixError, Payload,
    Rgb, SessionConfig, SessionError, StoreError,
};
use std::path::Path;

fn session_in(root: &Path) -> EditorSession {
    let mut config = SessionConfig::default();
    config.sandbox = config.sandbox.with_scratch_root(root.join("scratch"));
    EditorSession::new(config).expect("session")
}

#[test]
fn starts_with_default_context_selected() {
    let root = tempfile::tempdir().expect("temp root");
    let session = session_in(root.path());

    assert_eq!(session.list_contexts(), vec!["default"]);
    assert_eq!(session.current_context(), Some("default"));
    assert_eq!(session.current_depth(), 0);

    let matrix = session.current_matrix().expect("default matrix");
    assert_eq!(matrix.quadtree_size(), 400);
    assert_eq!(matrix.max_depth(), 4);
    assert_eq!(matrix.painted_counts(), vec![0; 5]);
}

#[test]
fn depth_is_clamped_to_current_context() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());

    assert_eq!(session.set_depth(3), 3);
    assert_eq!(session.set_depth(9), 4);
    assert_eq!(session.current_depth(), 4);
}

#[test]
fn new_context_creates_then_replaces() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());

    let created = session.new_context(" field ").expect("create");
    assert_eq!(
        created,
        ActionResponse {
            ok: true,
            context_id: Some("field".to_string()),
            message: "Created context field".to_string(),
        }
    );
    session
        .paint(0, 0, Rgb(1, 2, 3))
        .expect("paint new context");

    let replaced = session.new_context("field").expect("replace");
    assert_eq!(replaced.message, "Replaced context field");
    assert_eq!(session.cell_color(0, 0).expect("color"), 0);
    assert_eq!(session.list_contexts(), vec!["default", "field"]);
    assert_eq!(session.current_context(), Some("field"));

    let err = session.new_context("   ").expect_err("blank id must fail");
    assert!(matches!(err, SessionError::InvalidContextId));
}

#[test]
fn selecting_unknown_context_fails() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());

    let err = session.select_context("nowhere").expect_err("unknown id");
    assert!(matches!(err, SessionError::Store(StoreError::NotFound(id)) if id == "nowhere"));
    assert_eq!(session.current_context(), Some("default"));
}

#[test]
fn resolves_positions_at_current_depth() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());

    assert_eq!(session.resolve_cell(10.0, 10.0), Some(CellKey::new(0, 0)));
    session.set_depth(2);
    assert_eq!(session.resolve_cell(150.0, 120.0), Some(CellKey::new(2, 5)));
    assert_eq!(session.resolve_cell(400.0, 10.0), None);

    session.set_quadtree_size(800).expect("resize");
    assert_eq!(session.resolve_cell(399.0, 10.0), Some(CellKey::new(2, 1)));
}

#[test]
fn paint_subdivide_reset_round() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());

    session.paint(1, 3, Rgb(0, 128, 0)).expect("paint");
    session
        .set_text(1, 3, "grove", Rgb(255, 255, 255))
        .expect("text");
    let children = session.subdivide(1, 3).expect("subdivide");

    for key in children {
        assert_eq!(session.cell_color(key.depth, key.index).expect("child"), 0x008000);
        assert_eq!(
            session.cell_payload(key.depth, key.index).expect("child"),
            Some(&Payload::text("grove", Rgb(255, 255, 255)))
        );
    }

    let removed = session.reset_cell(1, 3).expect("reset");
    assert!(removed.is_some());
    assert_eq!(session.cell_color(1, 3).expect("parent"), 0);
    assert_eq!(
        session.cell_color(children[0].depth, children[0].index).expect("child"),
        0x008000
    );
}

#[test]
fn invalid_addresses_surface_as_errors() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());

    let err = session.paint(1, 4, Rgb(1, 1, 1)).expect_err("bad index");
    assert!(matches!(
        err,
        SessionError::Matrix(MatrixError::IndexOutOfRange { depth: 1, index: 4, len: 4 })
    ));

    let err = session.subdivide(4, 0).expect_err("deepest layer");
    assert!(matches!(
        err,
        SessionError::Matrix(MatrixError::DepthExceeded { depth: 4, max_depth: 4 })
    ));
}

#[test]
fn export_then_import_selects_copy() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());
    session.paint(2, 9, Rgb(9, 9, 9)).expect("paint");
    let path = root.path().join("default.json");

    let exported = session.export_context(&path);
    assert!(exported.ok, "{}", exported.message);
    assert_eq!(exported.message, "Exported context default");

    session.set_depth(4);
    let imported = session.import_context(&path);
    assert!(imported.ok, "{}", imported.message);
    assert_eq!(imported.context_id.as_deref(), Some("default_1"));
    assert_eq!(imported.message, "Imported context default_1");
    assert_eq!(session.current_context(), Some("default_1"));
    assert_eq!(session.cell_color(2, 9).expect("imported color"), 0x090909);
}

#[test]
fn failed_file_actions_become_envelopes() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());

    let broken = root.path().join("broken.json");
    std::fs::write(&broken, "{\"version\": 1}").expect("write");
    let imported = session.import_context(&broken);
    assert!(!imported.ok);
    assert!(imported.message.starts_with("Import failed: "));
    assert_eq!(session.list_contexts(), vec!["default"]);

    let exported = session.export_context(root.path().join("missing").join("out.json"));
    assert!(!exported.ok);
    assert!(exported.message.starts_with("Export failed: "));
}

#[test]
fn attach_image_reads_file_bytes() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());
    let image = root.path().join("tile.png");
    std::fs::write(&image, [0x89, b'P', b'N', b'G']).expect("write image");

    let attached = session.attach_image_file(0, 0, &image).expect("attach");
    assert!(attached.ok);
    assert_eq!(
        session.cell_payload(0, 0).expect("payload"),
        Some(&Payload::image(vec![0x89, b'P', b'N', b'G']))
    );

    let missing = session
        .attach_image_file(0, 0, root.path().join("gone.png"))
        .expect("valid address");
    assert!(!missing.ok);
    assert!(missing.message.starts_with("Image load failed: "));
    assert!(session.cell_payload(0, 0).expect("payload").is_some());

    let err = session
        .attach_image_file(0, 1, &image)
        .expect_err("bad index");
    assert!(matches!(err, SessionError::Matrix(_)));
}

#[test]
fn cell_actions_follow_payload_and_depth() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());

    let plain = session.cell_actions(0, 0).expect("actions");
    assert!(plain.contains(&CellAction::Subdivide));
    assert!(!plain.contains(&CellAction::ExecuteCode));

    session.save_code(1, 0, "print(1)", "Python").expect("code");
    let code = session.cell_actions(1, 0).expect("actions");
    assert!(code.contains(&CellAction::EditCode));
    assert!(code.contains(&CellAction::ExecuteCode));

    let deepest = session.cell_actions(4, 255).expect("actions");
    assert!(!deepest.contains(&CellAction::Subdivide));
    assert_eq!(deepest.last(), Some(&CellAction::ResetCell));
}

#[test]
fn execute_cell_requires_code_payload() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());

    let err = session.execute_cell(0, 0).expect_err("empty cell");
    assert!(matches!(err, SessionError::NoCodePayload(key) if key == CellKey::new(0, 0)));

    session.save_code(0, 0, "IDENTIFICATION DIVISION.", "cobol").expect("code");
    let report = session.execute_cell(0, 0).expect("valid cell");
    assert_eq!(report.outcome, ExecutionOutcome::Unsupported);

    let report = session.execute_code("x", "fortran");
    assert_eq!(
        report.into_pair(),
        (
            false,
            "No executor available for fortran. Would you like to create one?".to_string()
        )
    );
}

#[test]
fn removing_current_context_clears_selection() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());
    session.new_context("other").expect("create");
    session.set_depth(3);

    let removed = session.remove_context("other");
    assert!(removed.ok, "{}", removed.message);
    assert_eq!(removed.message, "Removed context other");
    assert_eq!(session.current_context(), None);
    assert_eq!(session.current_depth(), 0);
    assert_eq!(session.list_contexts(), vec!["default"]);

    let err = session.paint(0, 0, Rgb(1, 1, 1)).expect_err("nothing selected");
    assert!(matches!(err, SessionError::NoActiveContext));
    assert!(matches!(
        session.current_matrix(),
        Err(SessionError::NoActiveContext)
    ));
    assert_eq!(session.resolve_cell(1.0, 1.0), None);
    let exported = session.export_context(root.path().join("none.json"));
    assert!(!exported.ok);

    session.select_context("default").expect("select remaining");
    session.paint(0, 0, Rgb(1, 1, 1)).expect("paint after select");
}

#[test]
fn removing_other_context_keeps_selection() {
    let root = tempfile::tempdir().expect("temp root");
    let mut session = session_in(root.path());
    session.new_context("other").expect("create");

    assert!(session.remove_context("default").ok);
    assert_eq!(session.current_context(), Some("other"));

    let missing = session.remove_context("default");
    assert!(!missing.ok);
    assert_eq!(missing.message, "Unknown context default");
}
