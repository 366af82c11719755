//! Page handlers and the page table.
//!
//! Entry handlers clear the panel and draw the full layout.  Idle handlers
//! touch only what changed: a fresh reading, the running indicator, a
//! countdown digit, or the flasher.

use log::warn;

use super::input::{FAN_SPEED_FIELD, FieldFormat, HUMIDITY_FIELD};
use super::render::{COLUMNS, DIVIDER, ERROR_TEXT, Lcd, NO_READING_TEXT, STARS, format_value};
use super::{FieldShown, FlashState, HoldState, PageCtx, PageDescriptor, PageId};
use crate::app::commands::{KeyEvent, KeyKind};
use crate::app::events::{AppEvent, ControlLoop};
use crate::app::ports::{CalibrationPoint, CalibrationPointId, Hardware};
use crate::retry::retry;

const LAST_COL: u8 = COLUMNS - 1;
const INPUT_ROW: u8 = 3;

// Readings page layout
const READING_RIGHTMOST: u8 = 15;
const READING_MAX_CHARS: u8 = 7;
const ROW_TEMPERATURE: u8 = 1;
const ROW_HUMIDITY: u8 = 2;
const ROW_FAN: u8 = 3;
const HUMIDITY_DECIMALS: u8 = 1;
const TEMPERATURE_DECIMALS: u8 = 1;
const FAN_SPEED_DECIMALS: u8 = 0;

const INDICATOR_PERIOD_MS: u32 = 500;
const INDICATOR_LEFT: &str = ">>  ";
const INDICATOR_RIGHT: &str = "  >>";
const INDICATOR_IDLE: &str = "IDLE";

// Calibration
const RAW_MAX_CHARS: u8 = 5;
const CAL_RESET_TIMEOUT_MS: u32 = 2000;

// Out-of-range warning
const FLASH_PERIOD_MS: u32 = 700;
const FLASH_COUNT: u8 = 6;
const FLASHER_LEFT: &str = ">>>>>";
const FLASHER_RIGHT: &str = "<<<<<";
const FLASHER_CLEAR: &str = "     ";

/// Build the page table.  Must stay in the order of [`PageId`].
pub fn page_table<H: Hardware>() -> [PageDescriptor<H>; PageId::COUNT] {
    [
        PageDescriptor {
            id: PageId::Readings,
            name: "Readings",
            on_enter: readings_enter::<H>,
            on_idle: Some(readings_idle::<H>),
            on_key: Some(readings_key::<H>),
        },
        PageDescriptor {
            id: PageId::HumidityAdjust,
            name: "HumidityAdjust",
            on_enter: humidity_adjust_enter::<H>,
            on_idle: None,
            on_key: Some(humidity_adjust_key::<H>),
        },
        PageDescriptor {
            id: PageId::FanSpeedAdjust,
            name: "FanSpeedAdjust",
            on_enter: fan_speed_adjust_enter::<H>,
            on_idle: None,
            on_key: Some(fan_speed_adjust_key::<H>),
        },
        PageDescriptor {
            id: PageId::Calibration,
            name: "Calibration",
            on_enter: calibration_enter::<H>,
            on_idle: None,
            on_key: Some(calibration_key::<H>),
        },
        PageDescriptor {
            id: PageId::CalibrationPoint,
            name: "CalibrationPoint",
            on_enter: cal_point_enter::<H>,
            on_idle: Some(cal_point_idle::<H>),
            on_key: Some(cal_point_key::<H>),
        },
        PageDescriptor {
            id: PageId::CalibrationReset,
            name: "CalibrationReset",
            on_enter: cal_reset_enter::<H>,
            on_idle: Some(cal_reset_idle::<H>),
            on_key: Some(cal_reset_key::<H>),
        },
        PageDescriptor {
            id: PageId::Hold,
            name: "Hold",
            on_enter: hold_enter::<H>,
            on_idle: Some(hold_idle::<H>),
            on_key: Some(hold_key::<H>),
        },
        PageDescriptor {
            id: PageId::MinValError,
            name: "MinValError",
            on_enter: min_error_enter::<H>,
            on_idle: Some(limit_error_idle::<H>),
            on_key: None,
        },
        PageDescriptor {
            id: PageId::MaxValError,
            name: "MaxValError",
            on_enter: max_error_enter::<H>,
            on_idle: Some(limit_error_idle::<H>),
            on_key: None,
        },
    ]
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

fn readings_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    let mut lcd = Lcd::new(&mut *ctx.hw);
    lcd.reset();
    lcd.at(6, 0, "Readings");
    if ctx.app.config.show_temperature {
        lcd.at(7, ROW_TEMPERATURE, "T:        C");
    } else {
        lcd.at(0, 1, DIVIDER);
    }
    lcd.at(6, ROW_HUMIDITY, "RH:        %");
    lcd.at(5, ROW_FAN, "Fan:        RPM");

    ctx.page.humidity_shown = FieldShown::Nothing;
    ctx.page.fan_shown = FieldShown::Nothing;
    draw_humidity(ctx, true);
    draw_fan_speed(ctx, true);

    ctx.page.indicator_left = true;
    ctx.page.indicator_since_ms = ctx.now_ms;
    draw_indicators(ctx);
}

fn readings_idle<H: Hardware>(ctx: &mut PageCtx<'_, H>) -> Option<PageId> {
    draw_humidity(ctx, false);
    draw_fan_speed(ctx, false);

    if ctx.now_ms.wrapping_sub(ctx.page.indicator_since_ms) >= INDICATOR_PERIOD_MS {
        ctx.page.indicator_since_ms = ctx.now_ms;
        ctx.page.indicator_left = !ctx.page.indicator_left;
        draw_indicators(ctx);
    }
    None
}

fn readings_key<H: Hardware>(ctx: &mut PageCtx<'_, H>, event: KeyEvent) -> Option<PageId> {
    match (event.key, event.kind) {
        ('s', KeyKind::Pressed) => {
            ctx.app.input.reset();
            Some(PageId::HumidityAdjust)
        }
        ('h', kind) => control_key(ctx, ControlLoop::Humidity, kind),
        ('f', kind) => control_key(ctx, ControlLoop::FanSpeed, kind),
        _ => None,
    }
}

/// Press-to-start, hold-to-stop.  Starting happens on release so the
/// release that ends a hold-to-stop can be swallowed.
fn control_key<H: Hardware>(ctx: &mut PageCtx<'_, H>, control: ControlLoop, kind: KeyKind) -> Option<PageId> {
    let state = *ctx.app.control_state(control);
    if state.active {
        if kind == KeyKind::Hold {
            ctx.page.hold = HoldState {
                control,
                since_ms: ctx.now_ms,
                seconds_remaining: ctx.app.config.key_hold_duration_ms / 1000,
            };
            return Some(PageId::Hold);
        }
    } else if kind == KeyKind::Released {
        if state.recently_stopped {
            ctx.app.control_state_mut(control).recently_stopped = false;
        } else {
            ctx.app.start_control(control, &mut *ctx.hw, &mut *ctx.sink);
        }
    }
    None
}

/// Humidity (and temperature) fields.  Values redraw on a fresh reading,
/// `ERROR` only when the field changes state.
fn draw_humidity<H: Hardware>(ctx: &mut PageCtx<'_, H>, entry: bool) {
    let show_temperature = ctx.app.config.show_temperature;
    let acq = &mut ctx.app.acquisition;
    let shown = &mut ctx.page.humidity_shown;
    let mut lcd = Lcd::new(&mut *ctx.hw);

    if acq.humidity.is_ok() {
        let fresh = acq.humidity.take_for_display();
        if fresh || entry || *shown != FieldShown::Value {
            lcd.reading_right_aligned(
                acq.humidity.value(),
                HUMIDITY_DECIMALS,
                READING_MAX_CHARS,
                READING_RIGHTMOST,
                ROW_HUMIDITY,
            );
            if show_temperature {
                lcd.reading_right_aligned(
                    acq.temperature.value(),
                    TEMPERATURE_DECIMALS,
                    READING_MAX_CHARS,
                    READING_RIGHTMOST,
                    ROW_TEMPERATURE,
                );
            }
            *shown = FieldShown::Value;
        }
    } else if *shown != FieldShown::Error {
        lcd.text_reading(ERROR_TEXT, READING_MAX_CHARS, READING_RIGHTMOST, ROW_HUMIDITY);
        if show_temperature {
            lcd.text_reading(ERROR_TEXT, READING_MAX_CHARS, READING_RIGHTMOST, ROW_TEMPERATURE);
        }
        *shown = FieldShown::Error;
    }
}

/// Fan speed field.  The tachometer only reads true while the loop is
/// running, so an idle fan shows `N/A` rather than an error.
fn draw_fan_speed<H: Hardware>(ctx: &mut PageCtx<'_, H>, entry: bool) {
    let active = ctx.app.fan.state.active;
    let reading = &mut ctx.app.acquisition.fan_speed;
    let shown = &mut ctx.page.fan_shown;
    let mut lcd = Lcd::new(&mut *ctx.hw);

    if !active {
        // Readings taken while idle are meaningless; drop them.  After a
        // start the field keeps `N/A` until the next fetch, up to one
        // acquisition period later.
        reading.take_for_display();
        if *shown != FieldShown::NotAvailable {
            lcd.text_reading(NO_READING_TEXT, READING_MAX_CHARS, READING_RIGHTMOST, ROW_FAN);
            *shown = FieldShown::NotAvailable;
        }
    } else if reading.is_ok() {
        if reading.take_for_display() || (entry && *shown != FieldShown::NotAvailable) {
            lcd.reading_right_aligned(
                reading.value(),
                FAN_SPEED_DECIMALS,
                READING_MAX_CHARS,
                READING_RIGHTMOST,
                ROW_FAN,
            );
            *shown = FieldShown::Value;
        }
    } else if *shown != FieldShown::Error {
        lcd.text_reading(ERROR_TEXT, READING_MAX_CHARS, READING_RIGHTMOST, ROW_FAN);
        *shown = FieldShown::Error;
    }
}

fn draw_indicators<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    let left = ctx.page.indicator_left;
    let symbol = |active: bool| match (active, left) {
        (false, _) => INDICATOR_IDLE,
        (true, true) => INDICATOR_LEFT,
        (true, false) => INDICATOR_RIGHT,
    };
    let humidity = symbol(ctx.app.humidity.state.active);
    let fan = symbol(ctx.app.fan.state.active);
    let mut lcd = Lcd::new(&mut *ctx.hw);
    lcd.at(0, ROW_HUMIDITY, humidity);
    lcd.at(0, ROW_FAN, fan);
}

// ---------------------------------------------------------------------------
// Hold-to-stop countdown
// ---------------------------------------------------------------------------

fn hold_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    let mut lcd = Lcd::new(&mut *ctx.hw);
    lcd.reset();
    lcd.at(0, 0, STARS);
    lcd.at(2, 1, "Hold button for");
    lcd.at(6, 2, "second(s)");
    lcd.at(0, 3, STARS);
    draw_seconds(ctx);
}

fn hold_idle<H: Hardware>(ctx: &mut PageCtx<'_, H>) -> Option<PageId> {
    let hold = ctx.page.hold;
    let elapsed = ctx.now_ms.wrapping_sub(hold.since_ms);
    let due = elapsed.saturating_add(hold.seconds_remaining.saturating_sub(1).saturating_mul(1000));
    if due < ctx.app.config.key_hold_duration_ms {
        return None;
    }

    ctx.page.hold.seconds_remaining = hold.seconds_remaining.saturating_sub(1);
    if ctx.page.hold.seconds_remaining == 0 {
        ctx.app.stop_control(hold.control, &mut *ctx.hw, &mut *ctx.sink);
        ctx.app.control_state_mut(hold.control).recently_stopped = true;
        return Some(PageId::Readings);
    }
    draw_seconds(ctx);
    None
}

/// Letting go early aborts; the loop keeps running.
fn hold_key<H: Hardware>(_ctx: &mut PageCtx<'_, H>, event: KeyEvent) -> Option<PageId> {
    (event.kind == KeyKind::Released).then_some(PageId::Readings)
}

fn draw_seconds<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    let seconds = format_value(ctx.page.hold.seconds_remaining as f32, 0);
    Lcd::new(&mut *ctx.hw).text_reading(&seconds, 4, 3, 2);
}

// ---------------------------------------------------------------------------
// Target adjustment
// ---------------------------------------------------------------------------

struct AdjustPage {
    control: ControlLoop,
    title: &'static str,
    title_col: u8,
    field: FieldFormat,
    next: PageId,
}

const HUMIDITY_ADJUST: AdjustPage = AdjustPage {
    control: ControlLoop::Humidity,
    title: "Relative humidity(%)",
    title_col: 0,
    field: HUMIDITY_FIELD,
    next: PageId::FanSpeedAdjust,
};

const FAN_SPEED_ADJUST: AdjustPage = AdjustPage {
    control: ControlLoop::FanSpeed,
    title: "Fan speed (RPM)",
    title_col: 2,
    field: FAN_SPEED_FIELD,
    next: PageId::Calibration,
};

fn humidity_adjust_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    adjust_enter(ctx, &HUMIDITY_ADJUST);
}

fn fan_speed_adjust_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    adjust_enter(ctx, &FAN_SPEED_ADJUST);
}

fn humidity_adjust_key<H: Hardware>(ctx: &mut PageCtx<'_, H>, event: KeyEvent) -> Option<PageId> {
    adjust_key(ctx, &HUMIDITY_ADJUST, event)
}

fn fan_speed_adjust_key<H: Hardware>(ctx: &mut PageCtx<'_, H>, event: KeyEvent) -> Option<PageId> {
    adjust_key(ctx, &FAN_SPEED_ADJUST, event)
}

fn adjust_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>, page: &AdjustPage) {
    let target = ctx.app.control_state(page.control).target;
    let mut lcd = Lcd::new(&mut *ctx.hw);
    lcd.reset();
    lcd.at(page.title_col, 0, page.title);
    lcd.at(0, 1, DIVIDER);
    lcd.at(0, 2, "Old target:");
    lcd.at(0, 3, "New target:");
    lcd.value_right_aligned(target, page.field.max_decimals, LAST_COL, 2);
    lcd.cursor(LAST_COL, INPUT_ROW);
    lcd.blink(true);
}

fn adjust_key<H: Hardware>(ctx: &mut PageCtx<'_, H>, page: &AdjustPage, event: KeyEvent) -> Option<PageId> {
    if event.kind != KeyKind::Pressed {
        return None;
    }
    if event.key == 's' {
        return save_input(ctx, page);
    }
    edit_input(ctx, page.field, event.key);
    None
}

/// Validate the entry against the inclusive target range.  An empty entry
/// keeps the old target.
fn save_input<H: Hardware>(ctx: &mut PageCtx<'_, H>, page: &AdjustPage) -> Option<PageId> {
    if ctx.app.input.is_empty() {
        ctx.app.input.reset();
        return Some(page.next);
    }

    let value = ctx.app.input.value();
    let (min, max) = ctx.app.target_range(page.control);
    let rejected = if value > max {
        Some(PageId::MaxValError)
    } else if value < min {
        Some(PageId::MinValError)
    } else {
        None
    };
    if let Some(error_page) = rejected {
        ctx.page.flash = FlashState {
            control: page.control,
            since_ms: ctx.now_ms,
            cycles: 0,
            visible: true,
        };
        ctx.sink.emit(&AppEvent::InputRejected {
            control: page.control,
            value,
        });
        return Some(error_page);
    }

    ctx.app.commit_target(page.control, value, &mut *ctx.hw, &mut *ctx.sink);
    ctx.app.input.reset();
    Some(page.next)
}

/// Digit, delete, or dot.  The entry is redrawn only when it changed.
fn edit_input<H: Hardware>(ctx: &mut PageCtx<'_, H>, field: FieldFormat, key: char) {
    let input = &mut ctx.app.input;
    let changed = match key {
        '0'..='9' => input.push_digit(key as u8 - b'0', field),
        'd' => input.delete(),
        '.' => input.push_dot(field),
        _ => false,
    };
    if changed {
        let mut lcd = Lcd::new(&mut *ctx.hw);
        input.echo(field, &mut lcd);
    }
}

// ---------------------------------------------------------------------------
// Out-of-range warning
// ---------------------------------------------------------------------------

fn min_error_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    limit_error_enter(ctx, false);
}

fn max_error_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    limit_error_enter(ctx, true);
}

fn limit_error_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>, above_max: bool) {
    let control = ctx.page.flash.control;
    let (min, max) = ctx.app.target_range(control);
    let decimals = match control {
        ControlLoop::Humidity => HUMIDITY_FIELD.max_decimals,
        ControlLoop::FanSpeed => FAN_SPEED_FIELD.max_decimals,
    };
    let limit = format_value(if above_max { max } else { min }, decimals);

    let mut lcd = Lcd::new(&mut *ctx.hw);
    lcd.reset();
    lcd.at(0, 0, STARS);
    lcd.at(2, 1, if above_max { "Maximum value is" } else { "Minimum value is" });
    draw_flasher(&mut lcd, true);
    lcd.at((COLUMNS / 2 - 1).saturating_sub(limit.len() as u8 / 2), 2, &limit);
    lcd.at(0, 3, STARS);
}

fn limit_error_idle<H: Hardware>(ctx: &mut PageCtx<'_, H>) -> Option<PageId> {
    let flash = ctx.page.flash;
    let due = (u32::from(flash.cycles) + 1) * FLASH_PERIOD_MS;
    if ctx.now_ms.wrapping_sub(flash.since_ms) < due {
        return None;
    }

    ctx.page.flash.cycles += 1;
    if ctx.page.flash.cycles < FLASH_COUNT {
        ctx.page.flash.visible = !flash.visible;
        draw_flasher(&mut Lcd::new(&mut *ctx.hw), ctx.page.flash.visible);
        return None;
    }

    ctx.app.input.reset();
    Some(match flash.control {
        ControlLoop::Humidity => PageId::HumidityAdjust,
        ControlLoop::FanSpeed => PageId::FanSpeedAdjust,
    })
}

fn draw_flasher<H: Hardware>(lcd: &mut Lcd<'_, H>, visible: bool) {
    let (left, right) = if visible {
        (FLASHER_LEFT, FLASHER_RIGHT)
    } else {
        (FLASHER_CLEAR, FLASHER_CLEAR)
    };
    lcd.at(0, 2, left);
    lcd.at(COLUMNS - right.len() as u8, 2, right);
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

fn calibration_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    let mut lcd = Lcd::new(&mut *ctx.hw);
    lcd.reset();
    lcd.at(0, 0, "---RH calibration---");
    lcd.at(0, 1, "Press 1 for point 1");
    lcd.at(0, 2, "Press 2 for point 2");
    lcd.at(0, 3, "Press 3 to reset all");
}

fn calibration_key<H: Hardware>(ctx: &mut PageCtx<'_, H>, event: KeyEvent) -> Option<PageId> {
    if event.kind != KeyKind::Pressed {
        return None;
    }
    match event.key {
        's' => {
            ctx.app.input.reset();
            Some(PageId::Readings)
        }
        '1' | '2' => {
            ctx.page.cal_point = if event.key == '1' {
                CalibrationPointId::One
            } else {
                CalibrationPointId::Two
            };
            ctx.app.input.reset();
            Some(PageId::CalibrationPoint)
        }
        '3' => Some(PageId::CalibrationReset),
        _ => None,
    }
}

fn cal_point_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    let point = ctx.page.cal_point;
    let saved = ctx.hw.saved_calibration(point);
    let raw = ctx.hw.raw_humidity();
    let digit = format_value(f32::from(point.number()), 0);

    let mut lcd = Lcd::new(&mut *ctx.hw);
    lcd.reset();
    lcd.at(0, 0, "------Point  -------");
    lcd.at(12, 0, &digit);
    lcd.at(0, 1, "raw:      ref.:");
    lcd.at(3, 2, "New raw RH:");
    lcd.at(2, 3, "New ref. RH:");

    match saved {
        Some(p) => {
            lcd.value_right_aligned(p.raw, HUMIDITY_DECIMALS, 8, 1);
            lcd.value_right_aligned(p.reference, HUMIDITY_DECIMALS, LAST_COL, 1);
        }
        None => {
            lcd.at(5, 1, NO_READING_TEXT);
            lcd.at(16, 1, NO_READING_TEXT);
        }
    }

    lcd.value_right_aligned(raw, HUMIDITY_DECIMALS, LAST_COL, 2);
    lcd.cursor(LAST_COL, INPUT_ROW);
    lcd.blink(true);
    ctx.page.humidity_shown = FieldShown::Value;
}

/// Only the raw reading is redrawn; the cursor goes back to the entry.
fn cal_point_idle<H: Hardware>(ctx: &mut PageCtx<'_, H>) -> Option<PageId> {
    let reading = &mut ctx.app.acquisition.humidity;
    let shown = &mut ctx.page.humidity_shown;
    let raw = ctx.hw.raw_humidity();

    if reading.is_ok() {
        if !reading.take_for_display() {
            return None;
        }
        let mut lcd = Lcd::new(&mut *ctx.hw);
        lcd.blink(false);
        lcd.reading_right_aligned(raw, HUMIDITY_DECIMALS, RAW_MAX_CHARS, LAST_COL, 2);
        lcd.cursor(LAST_COL, INPUT_ROW);
        lcd.blink(true);
        *shown = FieldShown::Value;
    } else if *shown != FieldShown::Error {
        let mut lcd = Lcd::new(&mut *ctx.hw);
        lcd.blink(false);
        lcd.text_reading(ERROR_TEXT, RAW_MAX_CHARS, LAST_COL, 2);
        lcd.cursor(LAST_COL, INPUT_ROW);
        lcd.blink(true);
        *shown = FieldShown::Error;
    }
    None
}

/// Edit the reference value; `s` stores it against the current raw
/// reading.
fn cal_point_key<H: Hardware>(ctx: &mut PageCtx<'_, H>, event: KeyEvent) -> Option<PageId> {
    if event.kind != KeyKind::Pressed {
        return None;
    }
    if event.key != 's' {
        edit_input(ctx, HUMIDITY_FIELD, event.key);
        return None;
    }

    if !ctx.app.input.is_empty() {
        let id = ctx.page.cal_point;
        let point = CalibrationPoint {
            reference: ctx.app.input.value(),
            raw: ctx.hw.raw_humidity(),
        };
        match retry(|| ctx.hw.save_calibration(id, point)) {
            Ok(()) => ctx.sink.emit(&AppEvent::CalibrationSaved(id)),
            Err(e) => warn!("calibration: saving point {} failed: {}", id.number(), e),
        }
    }
    ctx.app.input.reset();
    Some(PageId::Calibration)
}

fn cal_reset_enter<H: Hardware>(ctx: &mut PageCtx<'_, H>) {
    let mut lcd = Lcd::new(&mut *ctx.hw);
    lcd.reset();
    lcd.at(1, 0, "Reset calibration?");
    lcd.at(0, 1, "This will delete all");
    lcd.at(1, 2, "calibration data!!");
    lcd.at(0, 3, "--Press 5 to reset--");
    ctx.page.entered_ms = ctx.now_ms;
}

fn cal_reset_idle<H: Hardware>(ctx: &mut PageCtx<'_, H>) -> Option<PageId> {
    (ctx.now_ms.wrapping_sub(ctx.page.entered_ms) >= CAL_RESET_TIMEOUT_MS).then_some(PageId::Calibration)
}

fn cal_reset_key<H: Hardware>(ctx: &mut PageCtx<'_, H>, event: KeyEvent) -> Option<PageId> {
    if event.kind != KeyKind::Pressed || event.key != '5' {
        return None;
    }
    match retry(|| ctx.hw.reset_calibration()) {
        Ok(()) => ctx.sink.emit(&AppEvent::CalibrationCleared),
        Err(e) => warn!("calibration: reset failed: {}", e),
    }
    Some(PageId::Calibration)
}
