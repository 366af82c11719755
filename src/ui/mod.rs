//! Keypad-driven LCD menu as a function-pointer page machine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageTable                                                   │
//! │  ┌──────────────────┬──────────┬───────────────┬───────────┐ │
//! │  │ PageId           │ on_enter │ on_idle       │ on_key    │ │
//! │  ├──────────────────┼──────────┼───────────────┼───────────┤ │
//! │  │ Readings         │ fn(ctx)  │ fn->Option<>  │ fn->Opt<> │ │
//! │  │ HumidityAdjust   │ fn(ctx)  │ —             │ fn->Opt<> │ │
//! │  │ ...              │          │               │           │ │
//! │  └──────────────────┴──────────┴───────────────┴───────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A page change only marks the screen as changed.  On the next refresh
//! the new page's `on_enter` does the full clear and static layout; every
//! refresh after that calls `on_idle`, which draws incremental updates
//! only.  Key events go to `on_key` of the current page.  Any handler may
//! return `Some(next)` to change page.

pub mod input;
pub mod pages;
pub mod render;

use log::info;

use crate::app::commands::KeyEvent;
use crate::app::context::ChamberContext;
use crate::app::events::ControlLoop;
use crate::app::ports::{CalibrationPointId, EventSink, Hardware};

// ---------------------------------------------------------------------------
// Page identity
// ---------------------------------------------------------------------------

/// Every page of the menu.  Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PageId {
    Readings = 0,
    HumidityAdjust = 1,
    FanSpeedAdjust = 2,
    Calibration = 3,
    CalibrationPoint = 4,
    CalibrationReset = 5,
    Hold = 6,
    MinValError = 7,
    MaxValError = 8,
}

impl PageId {
    /// Total number of pages, used to size the table array.
    pub const COUNT: usize = 9;

    /// Convert an index back to `PageId`.  Out-of-range falls back to
    /// `Readings`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Readings,
            1 => Self::HumidityAdjust,
            2 => Self::FanSpeedAdjust,
            3 => Self::Calibration,
            4 => Self::CalibrationPoint,
            5 => Self::CalibrationReset,
            6 => Self::Hold,
            7 => Self::MinValError,
            8 => Self::MaxValError,
            _ => {
                debug_assert!(false, "invalid page index: {idx}");
                Self::Readings
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Readings => "Readings",
            Self::HumidityAdjust => "HumidityAdjust",
            Self::FanSpeedAdjust => "FanSpeedAdjust",
            Self::Calibration => "Calibration",
            Self::CalibrationPoint => "CalibrationPoint",
            Self::CalibrationReset => "CalibrationReset",
            Self::Hold => "Hold",
            Self::MinValError => "MinValError",
            Self::MaxValError => "MaxValError",
        }
    }
}

// ---------------------------------------------------------------------------
// Per-page scratch state
// ---------------------------------------------------------------------------

/// What a reading field currently shows, so status words are drawn once
/// rather than on every refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldShown {
    #[default]
    Nothing,
    Value,
    Error,
    NotAvailable,
}

/// Hold-to-stop countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldState {
    pub control: ControlLoop,
    pub since_ms: u32,
    pub seconds_remaining: u32,
}

/// Out-of-range warning flasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashState {
    /// Loop whose adjust page the warning returns to.
    pub control: ControlLoop,
    pub since_ms: u32,
    pub cycles: u8,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub indicator_left: bool,
    pub indicator_since_ms: u32,
    pub humidity_shown: FieldShown,
    pub fan_shown: FieldShown,
    pub cal_point: CalibrationPointId,
    pub entered_ms: u32,
    pub hold: HoldState,
    pub flash: FlashState,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            indicator_left: true,
            indicator_since_ms: 0,
            humidity_shown: FieldShown::Nothing,
            fan_shown: FieldShown::Nothing,
            cal_point: CalibrationPointId::One,
            entered_ms: 0,
            hold: HoldState {
                control: ControlLoop::Humidity,
                since_ms: 0,
                seconds_remaining: 0,
            },
            flash: FlashState {
                control: ControlLoop::Humidity,
                since_ms: 0,
                cycles: 0,
                visible: true,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Handler context and table
// ---------------------------------------------------------------------------

/// Everything a page handler may touch.
pub struct PageCtx<'a, H> {
    pub app: &'a mut ChamberContext,
    pub page: &'a mut PageState,
    pub hw: &'a mut H,
    pub sink: &'a mut dyn EventSink,
    pub now_ms: u32,
}

/// Full-page draw on entry.
pub type PageEnterFn<H> = fn(&mut PageCtx<'_, H>);

/// Per-refresh incremental update.  Returns `Some(next)` to change page.
pub type PageIdleFn<H> = fn(&mut PageCtx<'_, H>) -> Option<PageId>;

/// Key dispatch.  Returns `Some(next)` to change page.
pub type PageKeyFn<H> = fn(&mut PageCtx<'_, H>, KeyEvent) -> Option<PageId>;

/// Static descriptor for one page.
pub struct PageDescriptor<H> {
    pub id: PageId,
    pub name: &'static str,
    pub on_enter: PageEnterFn<H>,
    pub on_idle: Option<PageIdleFn<H>>,
    pub on_key: Option<PageKeyFn<H>>,
}

// ---------------------------------------------------------------------------
// Screen engine
// ---------------------------------------------------------------------------

/// Owns the current page and its scratch state.  The display itself is
/// only ever written from page handlers.
pub struct Screen {
    current: PageId,
    changed: bool,
    pub state: PageState,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    /// Start on the readings page; it is drawn on the first refresh.
    pub fn new() -> Self {
        Self {
            current: PageId::Readings,
            changed: true,
            state: PageState::default(),
        }
    }

    pub fn current(&self) -> PageId {
        self.current
    }

    /// True until the current page's entry has been drawn.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Switch page; the entry draw happens on the next refresh.
    pub fn change(&mut self, next: PageId) {
        info!("Screen transition: {} -> {}", self.current.name(), next.name());
        self.current = next;
        self.changed = true;
    }

    /// Draw the entry of a freshly changed page, or the incremental
    /// update of the current one.
    pub fn refresh<H: Hardware>(
        &mut self,
        app: &mut ChamberContext,
        hw: &mut H,
        sink: &mut dyn EventSink,
        now_ms: u32,
    ) {
        let table = pages::page_table::<H>();
        let desc = &table[self.current as usize];
        let mut ctx = PageCtx {
            app,
            page: &mut self.state,
            hw,
            sink,
            now_ms,
        };

        if self.changed {
            self.changed = false;
            (desc.on_enter)(&mut ctx);
        } else if let Some(idle) = desc.on_idle {
            if let Some(next) = idle(&mut ctx) {
                self.change(next);
            }
        }
    }

    /// Dispatch one keypad event to the current page.
    pub fn handle_key<H: Hardware>(
        &mut self,
        event: KeyEvent,
        app: &mut ChamberContext,
        hw: &mut H,
        sink: &mut dyn EventSink,
        now_ms: u32,
    ) {
        let table = pages::page_table::<H>();
        let Some(on_key) = table[self.current as usize].on_key else {
            return;
        };
        let mut ctx = PageCtx {
            app,
            page: &mut self.state,
            hw,
            sink,
            now_ms,
        };
        if let Some(next) = on_key(&mut ctx, event) {
            self.change(next);
        }
    }
}
