//! DOM naming convention of the application under test.
//!
//! Every selector the crate sends to the page driver is built here, so the
//! convention lives in one place.

// ============================================================================
// Navigation surface
// ============================================================================

pub const NAV_BUTTON: &str = "[id^='test-aux-btn-']";
pub const NAV_ROUTE_ATTR: &str = "data-route";
pub const NAV_TITLE_ATTR: &str = "data-title";

// ============================================================================
// CRUD toolbar
// ============================================================================

pub const CRUD_NEW: &str = "#cbutton-new";
pub const CRUD_SAVE: &str = "#cbutton-save";
pub const CRUD_DELETE: &str = "#cbutton-delete";
pub const CRUD_REFRESH: &str = "#cbutton-refresh";
pub const CRUD_CANCEL: &str = "#cbutton-cancel";
pub const CRUD_EDIT: &str = "#cbutton-edit";
pub const CONFIRM_YES: &str = "#cbutton-yes";

/// Controls counted when deciding whether a page carries a CRUD toolbar.
pub const CRUD_TOOLBAR_PROBE: [&str; 4] = [CRUD_NEW, CRUD_DELETE, CRUD_SAVE, CRUD_REFRESH];

pub const CLONE_BUTTON: &str = "#cbutton-copy-to, #cbutton-clone, [id*='copy-to'], [id*='clone']";

// ============================================================================
// Dialogs
// ============================================================================

pub const ERROR_DIALOG: &str =
    "#custom-exception-dialog[opened], #custom-exception-details-dialog[opened]";
pub const OPEN_DIALOG: &str = "vaadin-dialog-overlay[opened]";
pub const DIALOG_DISMISS: &str =
    "vaadin-dialog-overlay[opened] :is(#cbutton-cancel, #cbutton-close, [part='close-button'])";
pub const DIALOG_SAVE: &str = "vaadin-dialog-overlay[opened] #cbutton-save";
pub const DIALOG_TEXT: &str = "vaadin-dialog-overlay[opened] :is(input, textarea)";
pub const DIALOG_FILE: &str = "vaadin-dialog-overlay[opened] input[type='file']";

// ============================================================================
// Grid
// ============================================================================

pub const GRID: &str = "vaadin-grid, vaadin-grid-pro, so-grid, c-grid";
pub const GRID_CELL: &str = "vaadin-grid-cell-content";
pub const GRID_SELECTED_CELL: &str = "vaadin-grid-cell-content[selected]";
pub const GRID_SORTER: &str = "vaadin-grid-sorter";
pub const GRID_FILTER: &str = "vaadin-text-field[id*='filter'] input";

// ============================================================================
// Form fields
// ============================================================================

pub const FIELD: &str = "[id^='field-']";
pub const FIELD_PREFIX: &str = "field-";
pub const STATUS_FIELD: &str = "[id^='field-'][id*='status']";
pub const INNER_INPUT: &str = ":is(input, textarea)";
pub const COMBO_OPTION: &str = "vaadin-combo-box-overlay[opened] vaadin-combo-box-item";

pub const RELATION_AVAILABLE: &str = "[id$='-available']";
pub const RELATION_SELECTED: &str = "[id$='-selected']";
pub const RELATION_ADD: &str = "[id$='-add']";
pub const RELATION_REMOVE: &str = "[id$='-remove']";

pub const DATE_PICKER: &str = "vaadin-date-picker, vaadin-date-time-picker";
pub const DATE_PICKER_OVERLAY: &str = "vaadin-date-picker-overlay[opened]";

// ============================================================================
// Tabs and kanban
// ============================================================================

pub const TAB: &str = "vaadin-tabs vaadin-tab";

pub const KANBAN_BOARD: &str = "[id^='kanban-board']";
pub const KANBAN_COLUMN: &str = "[id^='kanban-column-']";
pub const KANBAN_CARD: &str = "[id^='kanban-card-']";
pub const KANBAN_BACKLOG_ATTR: &str = "data-backlog";
pub const NUMBER_INPUT: &str = "input[type='number']";

// ============================================================================
// Builders
// ============================================================================

/// `#id`
pub fn by_id(id: &str) -> String {
    format!("#{}", id)
}

/// Descendant `inner` of the element with `id`.
pub fn within(id: &str, inner: &str) -> String {
    format!("#{} {}", id, inner)
}

/// Items of the relation editor list matching `list` inside field `id`.
pub fn relation_items(id: &str, list: &str) -> String {
    format!("#{} {} {}", id, list, GRID_CELL)
}

/// Strip the field prefix from an element id: `field-activity-status` → `activity-status`.
pub fn field_name(id: &str) -> &str {
    id.strip_prefix(FIELD_PREFIX).unwrap_or(id)
}
