use std::collections::BTreeMap;

use page_sweep::browser::probe::DomProbe;
use page_sweep::browser::selectors::{
    by_id, relation_items, within, COMBO_OPTION, CONFIRM_YES, CRUD_CANCEL, CRUD_DELETE, CRUD_NEW,
    CRUD_REFRESH, CRUD_SAVE, DIALOG_DISMISS, ERROR_DIALOG, FIELD, GRID, GRID_CELL, GRID_FILTER,
    GRID_SELECTED_CELL, INNER_INPUT, KANBAN_BOARD, KANBAN_CARD, KANBAN_COLUMN, NAV_BUTTON,
    OPEN_DIALOG, RELATION_ADD, RELATION_AVAILABLE, RELATION_REMOVE, RELATION_SELECTED,
    STATUS_FIELD,
};
use page_sweep::error::{SweepError, SweepResult};

pub const BASE_URL: &str = "http://app.test";
pub const NAV_ROUTE: &str = "cpagetestauxillary";

const NAME: &str = "field-name";
const STATUS: &str = "field-status";
const ID: &str = "field-id";
const CREATED: &str = "field-created-date";
const MEMBERS: &str = "field-members";

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct FakeColumn {
    pub id: String,
    pub backlog: bool,
    pub cards: u32,
}

/// One page of the fake application.
#[derive(Debug, Clone)]
pub struct FakePage {
    pub route: String,
    pub title: String,
    pub crud: bool,
    pub rows: Vec<Row>,
    pub status_options: Vec<String>,
    pub filter: bool,
    pub fail_on_save: bool,
    pub error_on_load: bool,
    /// (available, selected) lists of the relation editor
    pub members: Option<(Vec<String>, Vec<String>)>,
    pub kanban: Vec<FakeColumn>,
    /// Form has a `field-name` text field; without it the grid shows status
    pub name_field: bool,
    /// Status option clicks that are swallowed before one sticks
    pub ignored_status_picks: u32,
    /// Saving an existing row leaves the store as it was
    pub updates_ignored: bool,
}

impl FakePage {
    /// CRUD page with a grid of `rows` names, a name field, a status combo,
    /// a read-only id and a created date.
    pub fn crud(route: &str, title: &str, rows: &[&str]) -> Self {
        Self {
            route: route.to_string(),
            title: title.to_string(),
            crud: true,
            rows: rows
                .iter()
                .map(|n| Row {
                    name: n.to_string(),
                    status: "Open".to_string(),
                })
                .collect(),
            status_options: vec!["Open".into(), "In Progress".into(), "Closed".into()],
            filter: false,
            fail_on_save: false,
            error_on_load: false,
            members: None,
            kanban: Vec::new(),
            name_field: true,
            ignored_status_picks: 0,
            updates_ignored: false,
        }
    }

    /// CRUD page whose only editable field is the status combo; `statuses`
    /// are the existing rows.
    pub fn combo_only(route: &str, title: &str, statuses: &[&str]) -> Self {
        Self {
            rows: statuses
                .iter()
                .map(|s| Row {
                    name: String::new(),
                    status: s.to_string(),
                })
                .collect(),
            name_field: false,
            ..Self::crud(route, title, &[])
        }
    }

    /// Page with no CRUD controls at all.
    pub fn plain(route: &str, title: &str) -> Self {
        Self {
            crud: false,
            rows: Vec::new(),
            ..Self::crud(route, title, &[])
        }
    }

    pub fn with_filter(mut self) -> Self {
        self.filter = true;
        self
    }

    pub fn with_status_options(mut self, options: &[&str]) -> Self {
        self.status_options = options.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn ignoring_status_picks(mut self, picks: u32) -> Self {
        self.ignored_status_picks = picks;
        self
    }

    pub fn ignoring_updates(mut self) -> Self {
        self.updates_ignored = true;
        self
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_on_save = true;
        self
    }

    pub fn error_on_load(mut self) -> Self {
        self.error_on_load = true;
        self
    }

    pub fn with_members(mut self, available: &[&str]) -> Self {
        self.members = Some((available.iter().map(|s| s.to_string()).collect(), Vec::new()));
        self
    }

    pub fn with_kanban(mut self, columns: &[(&str, bool, u32)]) -> Self {
        self.kanban = columns
            .iter()
            .map(|(id, backlog, cards)| FakeColumn {
                id: id.to_string(),
                backlog: *backlog,
                cards: *cards,
            })
            .collect();
        self
    }
}

#[derive(Debug, Clone)]
pub struct NavButton {
    pub id: String,
    pub title: String,
    pub route: Option<String>,
}

/// Stateful in-memory CRUD application speaking the crate's DOM naming
/// convention: navigation surface, toolbar, grid, form, combos, relation
/// editor, confirm and error dialogs, kanban board.
#[derive(Debug)]
pub struct FakeCrudApp {
    pub buttons: Vec<NavButton>,
    pub pages: Vec<FakePage>,
    current: Option<usize>,
    on_surface: bool,
    form: BTreeMap<String, String>,
    creating: bool,
    selected: Option<usize>,
    open_combo: Option<String>,
    picked_member: Option<(bool, usize)>,
    confirm_open: bool,
    error_dialog: bool,
    filter: String,
    pub actions: Vec<String>,
    pub screenshots: Vec<String>,
    pub visited: Vec<String>,
}

impl FakeCrudApp {
    pub fn new() -> Self {
        Self {
            buttons: Vec::new(),
            pages: Vec::new(),
            current: None,
            on_surface: false,
            form: BTreeMap::new(),
            creating: false,
            selected: None,
            open_combo: None,
            picked_member: None,
            confirm_open: false,
            error_dialog: false,
            filter: String::new(),
            actions: Vec::new(),
            screenshots: Vec::new(),
            visited: Vec::new(),
        }
    }

    /// Add a page and a navigation button pointing at it.
    pub fn with_page(mut self, page: FakePage) -> Self {
        self.buttons.push(NavButton {
            id: format!("test-aux-btn-{}", page.route),
            title: page.title.clone(),
            route: Some(page.route.clone()),
        });
        self.pages.push(page);
        self
    }

    pub fn with_routeless_button(mut self, id: &str, title: &str) -> Self {
        self.buttons.push(NavButton {
            id: id.to_string(),
            title: title.to_string(),
            route: None,
        });
        self
    }

    pub fn page(&self, route: &str) -> Option<&FakePage> {
        self.pages.iter().find(|p| p.route == route)
    }

    pub fn row_names(&self, route: &str) -> Vec<String> {
        self.page(route)
            .map(|p| p.rows.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn row_statuses(&self, route: &str) -> Vec<String> {
        self.page(route)
            .map(|p| p.rows.iter().map(|r| r.status.clone()).collect())
            .unwrap_or_default()
    }

    /// Navigate straight to a page, as the orchestrator would.
    pub fn open(&mut self, route: &str) {
        let url = format!("{}/{}", BASE_URL, route);
        let _ = self.navigate(&url);
    }

    /// Select the grid row with `name`, as a user click would.
    pub fn select_row(&mut self, name: &str) {
        let index = self.visible_rows().iter().position(|(_, row)| self.cell_text(row) == name);
        if let Some(i) = index {
            let _ = self.click(GRID_CELL, i as u32);
        }
    }

    // ------------------------------------------------------------------
    // Internal state
    // ------------------------------------------------------------------

    fn page_ref(&self) -> Option<&FakePage> {
        self.current.map(|i| &self.pages[i])
    }

    fn page_mut(&mut self) -> Option<&mut FakePage> {
        match self.current {
            Some(i) => self.pages.get_mut(i),
            None => None,
        }
    }

    fn is_crud(&self) -> bool {
        self.page_ref().map(|p| p.crud).unwrap_or(false)
    }

    fn visible_rows(&self) -> Vec<(usize, Row)> {
        let filter = self.filter.to_lowercase();
        self.page_ref()
            .map(|p| {
                p.rows
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| self.cell_text(r).to_lowercase().contains(&filter))
                    .map(|(i, r)| (i, r.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Text of a row's grid cell.
    fn cell_text(&self, row: &Row) -> String {
        if self.page_ref().map(|p| p.name_field).unwrap_or(true) {
            row.name.clone()
        } else {
            row.status.clone()
        }
    }

    fn field_ids(&self) -> Vec<&'static str> {
        if !self.is_crud() {
            return Vec::new();
        }
        let mut ids = vec![STATUS, ID, CREATED];
        if self.page_ref().map(|p| p.name_field).unwrap_or(false) {
            ids.insert(0, NAME);
        }
        if self.page_ref().map(|p| p.members.is_some()).unwrap_or(false) {
            ids.push(MEMBERS);
        }
        ids
    }

    fn field_tag(id: &str) -> &'static str {
        match id {
            STATUS => "vaadin-combo-box",
            CREATED => "vaadin-date-picker",
            MEMBERS => "c-relation-editor",
            _ => "vaadin-text-field",
        }
    }

    fn clear_form(&mut self) {
        self.form.clear();
        for id in [NAME, STATUS, ID, CREATED] {
            self.form.insert(id.to_string(), String::new());
        }
    }

    fn load_row(&mut self, index: usize) {
        let Some(row) = self.page_ref().and_then(|p| p.rows.get(index)).cloned() else {
            return;
        };
        self.form.insert(NAME.into(), row.name);
        self.form.insert(STATUS.into(), row.status);
        self.form.insert(ID.into(), (index + 1).to_string());
        self.form.insert(CREATED.into(), "2024-01-01".into());
        self.selected = Some(index);
        self.creating = false;
    }

    fn combo_options(&self) -> Vec<String> {
        match self.open_combo.as_deref() {
            Some(STATUS) => self.page_ref().map(|p| p.status_options.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn members(&self) -> Option<&(Vec<String>, Vec<String>)> {
        self.page_ref().and_then(|p| p.members.as_ref())
    }

    fn column_cards(&self, selector: &str) -> Option<(usize, u32)> {
        self.page_ref().and_then(|p| {
            p.kanban
                .iter()
                .enumerate()
                .find(|(_, c)| within(&c.id, KANBAN_CARD) == selector)
                .map(|(i, c)| (i, c.cards))
        })
    }

    fn save(&mut self) {
        if self.page_ref().map(|p| p.fail_on_save).unwrap_or(false) {
            self.error_dialog = true;
            return;
        }
        let row = Row {
            name: self.form.get(NAME).cloned().unwrap_or_default(),
            status: self.form.get(STATUS).cloned().unwrap_or_default(),
        };
        let (name_field, updates_ignored) = self
            .page_ref()
            .map(|p| (p.name_field, p.updates_ignored))
            .unwrap_or((true, false));
        let identity = if name_field { &row.name } else { &row.status };
        if identity.is_empty() {
            // Required field missing
            self.error_dialog = true;
            return;
        }
        if updates_ignored && !self.creating {
            // Store untouched; the form keeps showing the edit
            return;
        }
        if self.creating {
            let index = match self.page_mut() {
                Some(page) => {
                    page.rows.push(row);
                    page.rows.len() - 1
                }
                None => return,
            };
            self.load_row(index);
        } else if let Some(index) = self.selected {
            if let Some(page) = self.page_mut() {
                page.rows[index] = row;
            }
            self.load_row(index);
        }
    }

    fn confirm_delete(&mut self) {
        self.confirm_open = false;
        if let Some(index) = self.selected.take() {
            if let Some(page) = self.page_mut() {
                page.rows.remove(index);
            }
            self.clear_form();
        }
    }
}

impl DomProbe for FakeCrudApp {
    fn navigate(&mut self, url: &str) -> SweepResult<()> {
        self.actions.push(format!("navigate {}", url));
        let route = url
            .strip_prefix(BASE_URL)
            .unwrap_or(url)
            .trim_start_matches('/')
            .to_string();
        self.on_surface = route == NAV_ROUTE;
        self.current = self.pages.iter().position(|p| p.route == route);
        if !self.on_surface && self.current.is_none() {
            return Err(SweepError::DriverProtocol {
                command: "navigate".into(),
                error: format!("404 {}", route),
            });
        }
        if self.current.is_some() {
            self.visited.push(route);
        }
        self.clear_form();
        self.creating = false;
        self.selected = None;
        self.open_combo = None;
        self.picked_member = None;
        self.confirm_open = false;
        self.filter.clear();
        self.error_dialog = self.page_ref().map(|p| p.error_on_load).unwrap_or(false);
        Ok(())
    }

    fn current_url(&mut self) -> SweepResult<String> {
        let route = match self.page_ref() {
            Some(p) => p.route.clone(),
            None => NAV_ROUTE.to_string(),
        };
        Ok(format!("{}/{}", BASE_URL, route))
    }

    fn count(&mut self, selector: &str) -> SweepResult<u32> {
        let crud = self.is_crud() as u32;
        let count = match selector {
            NAV_BUTTON if self.on_surface => self.buttons.len() as u32,
            ERROR_DIALOG => self.error_dialog as u32,
            OPEN_DIALOG | DIALOG_DISMISS | CONFIRM_YES => self.confirm_open as u32,
            CRUD_NEW | CRUD_SAVE | CRUD_DELETE | CRUD_REFRESH | CRUD_CANCEL => crud,
            GRID => crud,
            GRID_CELL => self.visible_rows().len() as u32,
            GRID_SELECTED_CELL => self.selected.is_some() as u32,
            GRID_FILTER => self.page_ref().map(|p| p.filter as u32).unwrap_or(0),
            FIELD => self.field_ids().len() as u32,
            STATUS_FIELD => crud,
            COMBO_OPTION => self.combo_options().len() as u32,
            KANBAN_BOARD => self.page_ref().map(|p| !p.kanban.is_empty() as u32).unwrap_or(0),
            KANBAN_COLUMN => self.page_ref().map(|p| p.kanban.len() as u32).unwrap_or(0),
            s if s.starts_with("#field-status") => crud,
            s => {
                if let Some((_, cards)) = self.column_cards(s) {
                    cards
                } else if let Some((available, selected)) = self.members() {
                    if s == relation_items(MEMBERS, RELATION_AVAILABLE) {
                        available.len() as u32
                    } else if s == relation_items(MEMBERS, RELATION_SELECTED) {
                        selected.len() as u32
                    } else if [RELATION_ADD, RELATION_REMOVE, RELATION_AVAILABLE, RELATION_SELECTED]
                        .iter()
                        .any(|r| s == within(MEMBERS, r))
                    {
                        1
                    } else {
                        self.field_selector_count(s)
                    }
                } else {
                    self.field_selector_count(s)
                }
            }
        };
        Ok(count)
    }

    fn attribute(&mut self, selector: &str, index: u32, name: &str) -> SweepResult<Option<String>> {
        let i = index as usize;
        let value = match (selector, name) {
            (NAV_BUTTON, "id") => self.buttons.get(i).map(|b| b.id.clone()),
            (NAV_BUTTON, "data-route") => self.buttons.get(i).and_then(|b| b.route.clone()),
            (FIELD, "id") => self.field_ids().get(i).map(|s| s.to_string()),
            (STATUS_FIELD, "id") if self.is_crud() => Some(STATUS.to_string()),
            (KANBAN_COLUMN, "id") => self.page_ref().and_then(|p| p.kanban.get(i)).map(|c| c.id.clone()),
            (KANBAN_COLUMN, "data-backlog") => self
                .page_ref()
                .and_then(|p| p.kanban.get(i))
                .filter(|c| c.backlog)
                .map(|_| "true".to_string()),
            (s, "readonly") if s == by_id(ID) || s == by_id(CREATED) => Some(String::new()),
            _ => None,
        };
        Ok(value)
    }

    fn text(&mut self, selector: &str, index: u32) -> SweepResult<Option<String>> {
        let i = index as usize;
        let text = match selector {
            NAV_BUTTON => self.buttons.get(i).map(|b| format!("  {}  ", b.title)),
            GRID_CELL => self.visible_rows().get(i).map(|(_, r)| self.cell_text(r)),
            COMBO_OPTION => self.combo_options().get(i).cloned(),
            s => self.members().and_then(|(available, selected)| {
                if s == relation_items(MEMBERS, RELATION_AVAILABLE) {
                    available.get(i).cloned()
                } else if s == relation_items(MEMBERS, RELATION_SELECTED) {
                    selected.get(i).cloned()
                } else {
                    None
                }
            }),
        };
        Ok(text)
    }

    fn tag_name(&mut self, selector: &str, index: u32) -> SweepResult<Option<String>> {
        if selector == FIELD {
            return Ok(self.field_ids().get(index as usize).map(|id| Self::field_tag(id).to_string()));
        }
        Ok(None)
    }

    fn value(&mut self, selector: &str) -> SweepResult<Option<String>> {
        let id = selector.trim_start_matches('#');
        Ok(self.form.get(id).cloned())
    }

    fn click(&mut self, selector: &str, index: u32) -> SweepResult<()> {
        self.actions.push(format!("click {}#{}", selector, index));
        if self.count(selector)? <= index {
            return Err(SweepError::DriverProtocol {
                command: "click".into(),
                error: format!("no element {} at {}", selector, index),
            });
        }
        match selector {
            CRUD_NEW => {
                self.clear_form();
                self.creating = true;
                self.selected = None;
            }
            CRUD_SAVE => self.save(),
            CRUD_DELETE => {
                if self.selected.is_some() {
                    self.confirm_open = true;
                }
            }
            CONFIRM_YES => self.confirm_delete(),
            DIALOG_DISMISS => self.confirm_open = false,
            CRUD_REFRESH | CRUD_CANCEL => {}
            GRID_CELL => {
                if let Some((row, _)) = self.visible_rows().get(index as usize) {
                    let row = *row;
                    self.load_row(row);
                }
            }
            STATUS_FIELD => self.open_combo = Some(STATUS.to_string()),
            COMBO_OPTION => {
                let option = self.combo_options().get(index as usize).cloned();
                let swallowed = match self.page_mut() {
                    Some(page) if page.ignored_status_picks > 0 => {
                        page.ignored_status_picks -= 1;
                        true
                    }
                    _ => false,
                };
                if let (Some(field), Some(option)) = (self.open_combo.take(), option) {
                    if !swallowed {
                        self.form.insert(field, option);
                    }
                }
            }
            s if s == by_id(STATUS) => self.open_combo = Some(STATUS.to_string()),
            s if s == relation_items(MEMBERS, RELATION_AVAILABLE) => {
                self.picked_member = Some((true, index as usize));
            }
            s if s == relation_items(MEMBERS, RELATION_SELECTED) => {
                self.picked_member = Some((false, index as usize));
            }
            s if s == within(MEMBERS, RELATION_ADD) || s == within(MEMBERS, RELATION_REMOVE) => {
                let adding = s == within(MEMBERS, RELATION_ADD);
                let picked = self.picked_member.take();
                if let Some((available, selected)) = self.page_mut().and_then(|p| p.members.as_mut()) {
                    match picked {
                        Some((true, i)) if adding && i < available.len() => {
                            let item = available.remove(i);
                            selected.push(item);
                        }
                        Some((false, i)) if !adding && i < selected.len() => {
                            let item = selected.remove(i);
                            available.push(item);
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn fill(&mut self, selector: &str, value: &str) -> SweepResult<()> {
        self.actions.push(format!("fill {}={}", selector, value));
        if selector == GRID_FILTER {
            self.filter = value.to_string();
            return Ok(());
        }
        for id in [NAME, STATUS] {
            if selector == within(id, INNER_INPUT) {
                self.form.insert(id.to_string(), value.to_string());
                return Ok(());
            }
        }
        Err(SweepError::DriverProtocol {
            command: "fill".into(),
            error: format!("{} is not editable", selector),
        })
    }

    fn set_input_files(&mut self, selector: &str, path: &str) -> SweepResult<()> {
        self.actions.push(format!("upload {}={}", selector, path));
        Ok(())
    }

    fn press_key(&mut self, key: &str) -> SweepResult<()> {
        self.actions.push(format!("key {}", key));
        if key == "Escape" && self.open_combo.take().is_none() {
            self.confirm_open = false;
        }
        Ok(())
    }

    fn drag(&mut self, source: &str, target: &str) -> SweepResult<()> {
        self.actions.push(format!("drag {} -> {}", source, target));
        let Some((from, cards)) = self.column_cards(source) else {
            return Ok(());
        };
        let to = self
            .page_ref()
            .and_then(|p| p.kanban.iter().position(|c| by_id(&c.id) == target));
        if let (Some(to), Some(page)) = (to, self.page_mut()) {
            if cards > 0 && from != to {
                page.kanban[from].cards -= 1;
                page.kanban[to].cards += 1;
            }
        }
        Ok(())
    }

    fn wait_ms(&mut self, _ms: u64) -> SweepResult<()> {
        Ok(())
    }

    fn wait_for(&mut self, selector: &str, _timeout_ms: u64) -> SweepResult<bool> {
        Ok(self.count(selector)? > 0)
    }

    fn screenshot(&mut self, path: &str) -> SweepResult<()> {
        self.screenshots.push(path.to_string());
        Ok(())
    }
}

impl FakeCrudApp {
    /// Containers and inner inputs of the form fields.
    fn field_selector_count(&self, selector: &str) -> u32 {
        for id in self.field_ids() {
            if selector == by_id(id) {
                return 1;
            }
            if selector == within(id, INNER_INPUT) && id != MEMBERS {
                return 1;
            }
        }
        0
    }
}
