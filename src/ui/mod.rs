/// Views for the editor window
///
/// - Draft list and endpoint setting (sidebar.rs)
/// - Metadata fields, image preview and content editor (form.rs)

pub mod form;
pub mod sidebar;
