//! Browser bindings.
//!
//! Implements the engine collaborators on top of `web-sys` and `gloo`: a DOM
//! [`Surface`], a `localStorage` [`KeyValueStore`] and [`Timers`] backed by
//! `setTimeout` / `setInterval`. Each mounted page object owns its engine (or
//! form) behind `Rc<RefCell<_>>`; listeners and timers only hold `Weak`
//! handles, so dropping the page object tears everything down.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo::events::{EventListener, EventListenerOptions};
use gloo::timers::callback::{Interval, Timeout};
use tracing::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlInputElement, Storage};

use crate::board::{Board, Engine, GameEvent, KeyValueStore, Level, Surface};
use crate::config::{FormConfig, GameConfig, GameIds, PageConfig};
use crate::error::{InitError, StoreError};
use crate::form::{
    ContactForm, FieldChange, FieldId, FieldView, FormEvent, FormOutcome, FormSummary,
    REJECTED_MESSAGE,
};
use crate::timer::{TimerId, Timers};

type WebEngine = Engine<DomSurface, LocalStore, BrowserTimers>;

// --- Lookups ----------------------------------------------------------------------

fn document() -> Result<Document, InitError> {
    web_sys::window()
        .ok_or_else(|| InitError::new("no window"))?
        .document()
        .ok_or_else(|| InitError::new("no document"))
}

fn element(doc: &Document, id: &str) -> Result<Element, InitError> {
    doc.get_element_by_id(id)
        .ok_or_else(|| InitError::missing_element(id))
}

fn typed<T: JsCast>(doc: &Document, id: &str) -> Result<T, InitError> {
    element(doc, id)?
        .dyn_into::<T>()
        .map_err(|_| InitError::new(format!("#{id} has an unexpected element type")))
}

/// Attribute of the closest ancestor of the event target matching `selector`.
fn closest_attr(event: &Event, selector: &str, attr: &str) -> Option<String> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    target.closest(selector).ok()??.get_attribute(attr)
}

fn millis(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

// --- Surface ----------------------------------------------------------------------

/// Game surface over the page's board container and counter elements.
pub struct DomSurface {
    doc: Document,
    board: Element,
    moves: Element,
    matches: Element,
    timer: Element,
    win: Element,
    best_easy: Element,
    best_hard: Element,
}

impl DomSurface {
    pub fn new(doc: &Document, ids: &GameIds) -> Result<Self, InitError> {
        Ok(Self {
            doc: doc.clone(),
            board: element(doc, &ids.board)?,
            moves: element(doc, &ids.moves)?,
            matches: element(doc, &ids.matches)?,
            timer: element(doc, &ids.timer)?,
            win: element(doc, &ids.win)?,
            best_easy: element(doc, &ids.best_easy)?,
            best_hard: element(doc, &ids.best_hard)?,
        })
    }

    fn card(&self, index: usize, symbol: &str, revealed: bool, matched: bool) -> Result<Element, JsValue> {
        let card = self.doc.create_element("div")?;
        let class = match (revealed, matched) {
            (_, true) => "card flipped matched",
            (true, false) => "card flipped",
            (false, false) => "card",
        };
        card.set_class_name(class);
        card.set_attribute("data-index", &index.to_string())?;
        if revealed {
            card.set_text_content(Some(symbol));
        }
        Ok(card)
    }
}

impl Surface for DomSurface {
    fn render(&mut self, board: &Board) {
        self.board.set_text_content(None);
        self.board.set_attribute("data-level", &board.level().to_string()).ok();
        for (index, tile) in board.tiles().iter().enumerate() {
            let appended = self
                .card(index, tile.symbol, tile.revealed, tile.matched)
                .and_then(|card| self.board.append_child(&card));
            if let Err(err) = appended {
                warn!(index, error = ?err, "failed to render tile");
                return;
            }
        }
    }

    fn set_counters(&mut self, moves: u32, matches: u32) {
        self.moves.set_text_content(Some(&moves.to_string()));
        self.matches.set_text_content(Some(&matches.to_string()));
    }

    fn set_elapsed(&mut self, text: &str) {
        self.timer.set_text_content(Some(text));
    }

    fn show_win(&mut self) {
        let classes = self.win.class_list();
        classes.remove_1("hidden").ok();
        classes.add_1("show").ok();
    }

    fn hide_win(&mut self) {
        let classes = self.win.class_list();
        classes.remove_1("show").ok();
        classes.add_1("hidden").ok();
    }

    fn set_best_scores(&mut self, easy: Option<u32>, hard: Option<u32>) {
        let show = |best: Option<u32>| best.map_or_else(|| "-".to_owned(), |m| m.to_string());
        self.best_easy.set_text_content(Some(&show(easy)));
        self.best_hard.set_text_content(Some(&show(hard)));
    }
}

// --- Store ------------------------------------------------------------------------

/// `window.localStorage`.
pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    pub fn new() -> Result<Self, InitError> {
        let storage = web_sys::window()
            .ok_or_else(|| InitError::new("no window"))?
            .local_storage()
            .ok()
            .flatten()
            .ok_or_else(|| InitError::new("localStorage unavailable"))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| StoreError::new(format!("setItem({key}) failed: {err:?}")))
    }
}

// --- Timers -----------------------------------------------------------------------

/// Live gloo handles; dropping one clears the browser timer.
enum Handle {
    /// The flag flips once the callback has run; fired handles are pruned
    /// lazily so a callback never drops its own closure.
    Once { _timeout: Timeout, fired: Rc<Cell<bool>> },
    Repeat { _interval: Interval },
}

/// `gloo` timers delivering events back into the owning engine.
pub struct BrowserTimers {
    target: Weak<RefCell<WebEngine>>,
    next_id: u64,
    live: HashMap<TimerId, Handle>,
}

impl BrowserTimers {
    fn new(target: Weak<RefCell<WebEngine>>) -> Self {
        Self {
            target,
            next_id: 0,
            live: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> TimerId {
        self.live
            .retain(|_, handle| !matches!(handle, Handle::Once { fired, .. } if fired.get()));
        self.next_id += 1;
        TimerId(self.next_id)
    }
}

impl Timers for BrowserTimers {
    fn after(&mut self, delay: Duration, event: GameEvent) -> TimerId {
        let id = self.next_id();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let target = self.target.clone();
        let timeout = Timeout::new(millis(delay), move || {
            dispatch(&target, event);
            flag.set(true);
        });
        self.live.insert(
            id,
            Handle::Once {
                _timeout: timeout,
                fired,
            },
        );
        id
    }

    fn every(&mut self, period: Duration, event: GameEvent) -> TimerId {
        let id = self.next_id();
        let target = self.target.clone();
        let interval = Interval::new(millis(period), move || dispatch(&target, event));
        self.live.insert(id, Handle::Repeat { _interval: interval });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        // Dropping a gloo handle clears the browser timer.
        self.live.remove(&id);
    }
}

fn dispatch(target: &Weak<RefCell<WebEngine>>, event: GameEvent) {
    let Some(engine) = target.upgrade() else {
        return;
    };
    let Ok(mut engine) = engine.try_borrow_mut() else {
        warn!(?event, "engine busy, dropping event");
        return;
    };
    engine.handle_event(event);
}

/// Level of the game on the board, or `fallback` before the first start.
fn current_level(target: &Weak<RefCell<WebEngine>>, fallback: Level) -> Level {
    let Some(engine) = target.upgrade() else {
        return fallback;
    };
    let level = engine.try_borrow().ok().and_then(|engine| engine.level());
    level.unwrap_or(fallback)
}

/// Highlights the `data-level` button of `level` and clears the others.
fn mark_active(controls: &Element, level: Level) {
    let Ok(buttons) = controls.query_selector_all("[data-level]") else {
        return;
    };
    for i in 0..buttons.length() {
        let Some(button) = buttons.get(i).and_then(|node| node.dyn_into::<Element>().ok()) else {
            continue;
        };
        let active = button
            .get_attribute("data-level")
            .is_some_and(|name| Level::parse(&name) == level);
        button.class_list().toggle_with_force("active", active).ok();
    }
}

fn clicked_button(event: &Event) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(|el| el.closest("button").ok().flatten())
        .is_some()
}

// --- Game page --------------------------------------------------------------------

/// A mounted memory game. Keep it alive for as long as the game should run.
#[wasm_bindgen]
pub struct GamePage {
    engine: Rc<RefCell<WebEngine>>,
    controls: Element,
    default_level: Level,
    _listeners: Vec<EventListener>,
}

impl GamePage {
    pub fn mount(config: GameConfig) -> Result<Self, InitError> {
        let doc = document()?;
        let surface = DomSurface::new(&doc, &config.ids)?;
        let store = LocalStore::new()?;
        let board = element(&doc, &config.ids.board)?;
        let controls = element(&doc, &config.ids.controls)?;
        let default_level = config.default_level;

        let engine: Rc<RefCell<WebEngine>> = Rc::new_cyclic(|weak| {
            RefCell::new(Engine::new(
                surface,
                store,
                BrowserTimers::new(weak.clone()),
                config,
            ))
        });

        let target = Rc::downgrade(&engine);
        let tiles = EventListener::new(&board, "click", move |event| {
            let index = closest_attr(event, "[data-index]", "data-index")
                .and_then(|raw| raw.parse::<usize>().ok());
            if let Some(index) = index {
                dispatch(&target, GameEvent::TileClicked(index));
            }
        });
        // Level buttons switch level; any other button restarts the current one.
        let target = Rc::downgrade(&engine);
        let buttons = controls.clone();
        let starts = EventListener::new(&controls, "click", move |event| {
            let level = match closest_attr(event, "[data-level]", "data-level") {
                Some(name) => Level::parse(&name),
                None if clicked_button(event) => current_level(&target, default_level),
                None => return,
            };
            mark_active(&buttons, level);
            dispatch(&target, GameEvent::StartRequested(level));
        });

        let page = Self {
            engine,
            controls,
            default_level,
            _listeners: vec![tiles, starts],
        };
        page.start_level(default_level);
        info!(level = %default_level, "game mounted");
        Ok(page)
    }

    fn start_level(&self, level: Level) {
        mark_active(&self.controls, level);
        self.send(GameEvent::StartRequested(level));
    }

    fn send(&self, event: GameEvent) {
        dispatch(&Rc::downgrade(&self.engine), event);
    }
}

#[wasm_bindgen]
impl GamePage {
    /// Starts a new game. Unknown names mean easy; no name restarts the
    /// current level.
    pub fn start(&self, level: Option<String>) {
        let level = match level {
            Some(name) => Level::parse(&name),
            None => current_level(&Rc::downgrade(&self.engine), self.default_level),
        };
        self.start_level(level);
    }

    /// Name of the level on the board.
    pub fn level(&self) -> String {
        current_level(&Rc::downgrade(&self.engine), self.default_level).to_string()
    }

    /// Same as clicking the tile at `index`.
    pub fn select(&self, index: usize) {
        self.send(GameEvent::TileClicked(index));
    }

    pub fn moves(&self) -> u32 {
        self.engine.borrow().moves()
    }

    pub fn matches(&self) -> u32 {
        self.engine.borrow().matches()
    }
}

#[wasm_bindgen]
pub fn mount_game(config: Option<String>) -> Result<GamePage, JsValue> {
    let config = PageConfig::from_optional_json(config.as_deref()).map_err(InitError::from)?;
    Ok(GamePage::mount(config.game)?)
}

// --- Contact form page ------------------------------------------------------------

struct FormBinding {
    doc: Document,
    form: ContactForm,
    inputs: HashMap<FieldId, HtmlInputElement>,
    messages: HashMap<FieldId, Element>,
    submit: HtmlButtonElement,
    result: Element,
    popup: Element,
    popup_timer: Option<Timeout>,
}

impl FormBinding {
    fn on_input(&mut self, field: FieldId) {
        let Some(input) = self.inputs.get(&field).cloned() else {
            return;
        };
        let raw = input.value();
        let outcome = self.form.handle_event(FormEvent::FieldChanged { field, raw: raw.clone() });
        if let FormOutcome::Field(change) = outcome {
            self.apply_change(&input, &raw, &change);
        }
    }

    fn apply_change(&mut self, input: &HtmlInputElement, raw: &str, change: &FieldChange) {
        if change.value != raw {
            input.set_value(&change.value);
        }
        self.apply_view(change.field, &change.view);
        self.submit.set_disabled(!change.submit_enabled);
    }

    /// Valid or error style on the input, plus a message element right after
    /// it while the field is invalid.
    fn apply_view(&mut self, field: FieldId, view: &FieldView) {
        let Some(input) = self.inputs.get(&field) else {
            return;
        };
        let classes = input.class_list();
        classes.toggle_with_force("input-valid", view.valid).ok();
        match view.message.as_deref().filter(|_| view.invalid) {
            Some(message) => {
                classes.add_1("input-error").ok();
                if !self.messages.contains_key(&field) {
                    match self.doc.create_element("div") {
                        Ok(el) => {
                            el.set_class_name("error-message");
                            input.insert_adjacent_element("afterend", &el).ok();
                            self.messages.insert(field, el);
                        }
                        Err(err) => warn!(?field, error = ?err, "failed to create error message"),
                    }
                }
                if let Some(el) = self.messages.get(&field) {
                    el.set_text_content(Some(message));
                }
            }
            None => {
                classes.remove_1("input-error").ok();
                if let Some(el) = self.messages.remove(&field) {
                    el.remove();
                }
            }
        }
    }

    fn on_submit(&mut self) {
        // Re-read every input; autofill does not always fire `input`.
        for field in FieldId::ALL {
            self.on_input(field);
        }
        match self.form.handle_event(FormEvent::Submitted) {
            FormOutcome::Submitted(summary) => {
                self.render_summary(&summary);
                self.show_popup(&summary.confirmation());
            }
            FormOutcome::Rejected(fields) => {
                for (field, view) in fields {
                    self.apply_view(field, &view);
                }
                self.show_popup(REJECTED_MESSAGE);
            }
            FormOutcome::Field(_) => {}
        }
    }

    fn render_summary(&self, summary: &FormSummary) {
        self.result.set_text_content(None);
        for (label, value) in summary.rows() {
            let row = self.doc.create_element("p").and_then(|p| {
                let strong = self.doc.create_element("strong")?;
                strong.set_text_content(Some(&format!("{label}:")));
                p.append_child(&strong)?;
                p.append_with_str_1(&format!(" {value}"))?;
                self.result.append_child(&p)?;
                Ok(())
            });
            if let Err(err) = row {
                warn!(label, error = ?err, "failed to render summary row");
            }
        }
    }

    fn show_popup(&mut self, message: &str) {
        self.popup.set_text_content(Some(message));
        let classes = self.popup.class_list();
        classes.remove_1("hidden").ok();
        classes.add_1("show").ok();
        let popup = self.popup.clone();
        let hide_after = millis(self.form.config().popup_duration());
        // Replacing the handle cancels a popup timer that is still running.
        self.popup_timer = Some(Timeout::new(hide_after, move || {
            popup.class_list().remove_1("show").ok();
        }));
    }
}

/// A mounted contact form. Keep it alive for as long as the form should react.
#[wasm_bindgen]
pub struct ContactFormPage {
    binding: Rc<RefCell<FormBinding>>,
    _listeners: Vec<EventListener>,
}

impl ContactFormPage {
    pub fn mount(config: FormConfig) -> Result<Self, InitError> {
        let doc = document()?;
        let form_el = element(&doc, &config.ids.form)?;
        let submit: HtmlButtonElement = typed(&doc, &config.ids.submit)?;
        let result = element(&doc, &config.ids.result)?;
        let popup = element(&doc, &config.ids.popup)?;
        let mut inputs = HashMap::new();
        for field in FieldId::ALL {
            inputs.insert(field, typed::<HtmlInputElement>(&doc, field.dom_id())?);
        }
        submit.set_disabled(true);

        let binding = Rc::new(RefCell::new(FormBinding {
            doc,
            form: ContactForm::new(config),
            inputs,
            messages: HashMap::new(),
            submit,
            result,
            popup,
            popup_timer: None,
        }));

        let mut listeners = Vec::new();
        for field in FieldId::ALL {
            let Some(input) = binding.borrow().inputs.get(&field).cloned() else {
                continue;
            };
            let target = Rc::downgrade(&binding);
            listeners.push(EventListener::new(&input, "input", move |_| {
                with_binding(&target, |b| b.on_input(field));
            }));
        }
        let target = Rc::downgrade(&binding);
        let options = EventListenerOptions::enable_prevent_default();
        listeners.push(EventListener::new_with_options(&form_el, "submit", options, move |event| {
            event.prevent_default();
            with_binding(&target, FormBinding::on_submit);
        }));

        info!("contact form mounted");
        Ok(Self {
            binding,
            _listeners: listeners,
        })
    }
}

#[wasm_bindgen]
impl ContactFormPage {
    /// Whether the submit button is currently enabled.
    pub fn is_valid(&self) -> bool {
        self.binding.borrow().form.is_valid()
    }
}

fn with_binding(target: &Weak<RefCell<FormBinding>>, f: impl FnOnce(&mut FormBinding)) {
    let Some(binding) = target.upgrade() else {
        return;
    };
    let Ok(mut binding) = binding.try_borrow_mut() else {
        return;
    };
    f(&mut *binding);
}

#[wasm_bindgen]
pub fn mount_contact_form(config: Option<String>) -> Result<ContactFormPage, JsValue> {
    let config = PageConfig::from_optional_json(config.as_deref()).map_err(InitError::from)?;
    Ok(ContactFormPage::mount(config.form)?)
}
