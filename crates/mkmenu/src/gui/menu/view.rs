use super::SHADOW_OFFSET;
use super::model::{Ghost, Measure, Menu, MenuStyle};
use crate::gui::color::Color;
use crate::gui::geometry::{Direction, Rect, Size};
use cairo::{Context, FontSlant, FontWeight, Format, ImageSurface};
use palette::Srgba;
use strum::IntoEnumIterator;

fn set_source(cr: &Context, color: Color) {
    let (r, g, b, a) = Srgba::<f64>::from(color).into_components();
    cr.set_source_rgba(r, g, b, a);
}

fn select_font(cr: &Context, style: &MenuStyle) {
    cr.select_font_face(&style.font_family, FontSlant::Normal, FontWeight::Normal);
    cr.set_font_size(style.font_size);
}

/// Paints one item box: drop shadow, the four border edges, the fill and the
/// label.
struct ItemRenderer<'a> {
    style: &'a MenuStyle,
    rect: Rect,
    label: &'a str,
    background: Color,
    foreground: Color,
}

impl<'a> ItemRenderer<'a> {
    fn draw(&self, cr: &Context) -> Result<(), cairo::Error> {
        self.draw_shadow(cr)?;
        self.draw_border(cr)?;
        self.draw_fill(cr)?;
        self.draw_label(cr)
    }

    fn draw_shadow(&self, cr: &Context) -> Result<(), cairo::Error> {
        let Some(shadow) = self.style.shadow else {
            return Ok(());
        };
        set_source(cr, shadow);
        cr.rectangle(
            self.rect.origin.x + SHADOW_OFFSET,
            self.rect.origin.y + SHADOW_OFFSET,
            self.rect.size.width,
            self.rect.size.height,
        );
        cr.fill()
    }

    fn draw_border(&self, cr: &Context) -> Result<(), cairo::Error> {
        let bw = self.style.border_width;
        if bw <= 0.0 {
            return Ok(());
        }
        let Rect { origin: o, size: s } = self.rect;
        let [top, right, bottom, left] = self.style.border_colors;
        let edges = [
            (top, o.x, o.y, s.width, bw),
            (right, o.x + s.width - bw, o.y, bw, s.height),
            (bottom, o.x, o.y + s.height - bw, s.width, bw),
            (left, o.x, o.y, bw, s.height),
        ];
        for (color, x, y, w, h) in edges {
            set_source(cr, color);
            cr.rectangle(x, y, w, h);
            cr.fill()?;
        }
        Ok(())
    }

    fn draw_fill(&self, cr: &Context) -> Result<(), cairo::Error> {
        let bw = self.style.border_width.max(0.0);
        set_source(cr, self.background);
        cr.rectangle(
            self.rect.origin.x + bw,
            self.rect.origin.y + bw,
            (self.rect.size.width - 2.0 * bw).max(0.0),
            (self.rect.size.height - 2.0 * bw).max(0.0),
        );
        cr.fill()
    }

    fn draw_label(&self, cr: &Context) -> Result<(), cairo::Error> {
        if self.label.is_empty() {
            return Ok(());
        }
        let [pad_v, pad_h] = self.style.padding;
        let bw = self.style.border_width.max(0.0);
        select_font(cr, self.style);
        let ascent = cr.font_extents().map(|e| e.ascent()).unwrap_or(self.style.font_size);
        set_source(cr, self.foreground);
        cr.move_to(
            self.rect.origin.x + bw + pad_h,
            self.rect.origin.y + bw + pad_v + ascent,
        );
        cr.show_text(self.label)
    }
}

fn with_alpha<F>(cr: &Context, alpha: f64, paint: F) -> Result<(), cairo::Error>
where
    F: FnOnce(&Context) -> Result<(), cairo::Error>,
{
    if alpha >= 1.0 {
        return paint(cr);
    }
    cr.push_group();
    let result = paint(cr);
    cr.pop_group_to_source()?;
    result?;
    cr.paint_with_alpha(alpha.max(0.0))
}

fn draw_menu(cr: &Context, menu: &Menu) -> Result<(), cairo::Error> {
    if !menu.is_displayed() || menu.scale() <= 0.0 {
        return Ok(());
    }
    let anchor = menu.anchor();

    cr.save()?;
    cr.translate(anchor.x, anchor.y);
    cr.scale(menu.scale(), menu.scale());
    let result = with_alpha(cr, menu.opacity(), |cr| {
        for slot in Direction::iter() {
            let item = menu.slot(slot);
            if !item.is_bound() {
                continue;
            }
            let (background, foreground) = menu.slot_colors(slot);
            let renderer = ItemRenderer {
                style: menu.style(),
                rect: Rect::new(item.offset, item.size),
                label: &item.label,
                background,
                foreground,
            };
            with_alpha(cr, item.opacity, |cr| renderer.draw(cr))?;
        }
        Ok(())
    });
    cr.restore()?;
    result
}

fn draw_ghost(cr: &Context, ghost: &Ghost) -> Result<(), cairo::Error> {
    let renderer = ItemRenderer {
        style: &ghost.style,
        rect: ghost.rect,
        label: &ghost.label,
        background: ghost.background,
        foreground: ghost.foreground,
    };
    with_alpha(cr, ghost.opacity(), |cr| renderer.draw(cr))
}

pub fn draw(cr: &Context, menu: Option<&Menu>, ghost: Option<&Ghost>) -> Result<(), cairo::Error> {
    if let Some(menu) = menu {
        draw_menu(cr, menu)?;
    }
    if let Some(ghost) = ghost {
        draw_ghost(cr, ghost)?;
    }
    Ok(())
}

/// Measures labels with cairo's toy text API on a scratch surface.
pub struct CairoMeasure {
    cr: Option<Context>,
    family: String,
    size: f64,
}

impl CairoMeasure {
    pub fn new(family: &str, size: f64) -> Self {
        let cr = ImageSurface::create(Format::ARgb32, 1, 1)
            .and_then(|surface| Context::new(&surface))
            .inspect_err(|e| log::warn!("Text measurement unavailable, estimating: {}", e))
            .ok();
        Self {
            cr,
            family: family.to_string(),
            size,
        }
    }

    fn estimate(&self, text: &str) -> Size {
        Size::new(
            (text.chars().count() as f64 * self.size * 0.6).ceil(),
            (self.size * 1.2).ceil(),
        )
    }
}

impl Measure for CairoMeasure {
    fn text_size(&self, text: &str) -> Size {
        let Some(cr) = &self.cr else {
            return self.estimate(text);
        };
        cr.select_font_face(&self.family, FontSlant::Normal, FontWeight::Normal);
        cr.set_font_size(self.size);
        match (cr.text_extents(text), cr.font_extents()) {
            (Ok(text_ext), Ok(font_ext)) => {
                Size::new(text_ext.x_advance().ceil(), font_ext.height().ceil())
            }
            _ => self.estimate(text),
        }
    }
}
