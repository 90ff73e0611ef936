// crates/stitch-ui/src/theme.rs
//
// Stitch draws very little chrome: the player's transport bar and the status
// card. Only the widget states those use (labels, the spinner, buttons) are
// styled here; everything else keeps egui's dark defaults.
use egui::{Color32, Context, Stroke, Style, Visuals};

// ── Palette ──────────────────────────────────────────────────────────────────
pub const ACCENT:        Color32 = Color32::from_rgb(255, 160,  50);
const ACCENT_DIM:        Color32 = Color32::from_rgb(180, 100,  20);

pub const DARK_BG_2:     Color32 = Color32::from_rgb( 28,  28,  34);
const BUTTON_BG:         Color32 = Color32::from_rgb( 38,  38,  46);

const DARK_TEXT:         Color32 = Color32::from_rgb(220, 220, 230);
pub const DARK_TEXT_DIM: Color32 = Color32::from_rgb(120, 120, 138);
pub const DARK_BORDER:   Color32 = Color32::from_rgb( 55,  55,  68);

pub const ERROR:         Color32 = Color32::from_rgb(220,  90,  80);

/// Translucent fill for controls drawn over video.
pub const OVERLAY_BG:    Color32 = Color32::from_rgba_premultiplied(10, 10, 12, 200);

pub fn configure_style(ctx: &Context) {
    let mut style = Style::default();

    style.spacing.item_spacing   = egui::vec2(6.0, 5.0);
    style.spacing.button_padding = egui::vec2(10.0, 5.0);

    let cr = egui::CornerRadius::same(4);

    let mut v = Visuals::dark();
    v.panel_fill = Color32::BLACK;

    // Labels and the spinner.
    v.widgets.noninteractive.fg_stroke     = Stroke::new(1.0, DARK_TEXT_DIM);

    // Buttons: resting, under the pointer, pressed.
    v.widgets.inactive.bg_fill             = BUTTON_BG;
    v.widgets.inactive.weak_bg_fill        = BUTTON_BG;
    v.widgets.inactive.bg_stroke           = Stroke::new(1.0, DARK_BORDER);
    v.widgets.inactive.corner_radius       = cr;

    v.widgets.hovered.bg_fill              = BUTTON_BG;
    v.widgets.hovered.weak_bg_fill         = BUTTON_BG;
    v.widgets.hovered.bg_stroke            = Stroke::new(1.0, ACCENT_DIM);
    v.widgets.hovered.corner_radius        = cr;

    v.widgets.active.bg_fill               = ACCENT_DIM;
    v.widgets.active.weak_bg_fill          = ACCENT_DIM;
    v.widgets.active.bg_stroke             = Stroke::new(1.0, ACCENT);
    v.widgets.active.corner_radius         = cr;

    v.override_text_color = Some(DARK_TEXT);

    style.visuals = v;
    ctx.set_style(style);
}
