//! The connector line drawn from the gesture origin to the pointer.

use super::color::Color;
use super::geometry::Rect;
use crate::config::RayConfig;
use cairo::{Context, LineCap, Operator};
use mkctl::wm::Point;
use palette::Srgba;

/// Extra pixels cleared around the previous segment.
const STALE_MARGIN: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Stroke {
    color: Color,
    width: f64,
}

#[derive(Debug, Clone)]
pub struct Ray {
    core: Stroke,
    border: Stroke,
    segment: Option<(Point, Point)>,
    stale: Option<Rect>,
    attached: bool,
}

impl Ray {
    pub fn new(config: &RayConfig) -> Self {
        let core = Stroke {
            color: Color::parse(&config.color).with_alpha(config.opacity),
            width: config.width.max(0.0),
        };
        let border = Stroke {
            color: Color::parse(&config.border_color).with_alpha(config.border_opacity),
            width: config.border_width.max(0.0),
        };
        Self {
            core,
            border,
            segment: None,
            stale: None,
            attached: false,
        }
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Removes the line. The region it covered is left to be cleared.
    pub fn detach(&mut self) {
        self.attached = false;
        self.retire();
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn segment(&self) -> Option<(Point, Point)> {
        self.segment
    }

    /// Moves the line to `from -> to`, remembering where the old one was.
    pub fn update(&mut self, from: Point, to: Point) {
        self.retire();
        self.segment = Some((from, to));
    }

    /// Area painted by the current segment, including the border stroke.
    pub fn dirty_rect(&self) -> Option<Rect> {
        self.segment
            .map(|(from, to)| Rect::around_segment(from, to, self.border.width / 2.0 + STALE_MARGIN))
    }

    pub fn stale_rect(&self) -> Option<Rect> {
        self.stale
    }

    fn retire(&mut self) {
        if let Some(rect) = self.dirty_rect() {
            self.stale = Some(rect);
        }
        self.segment = None;
    }

    pub fn paint(&mut self, cr: &Context) -> Result<(), cairo::Error> {
        if let Some(stale) = self.stale.take() {
            cr.save()?;
            cr.set_operator(Operator::Clear);
            cr.rectangle(stale.origin.x, stale.origin.y, stale.size.width, stale.size.height);
            cr.fill()?;
            cr.restore()?;
        }

        let Some((from, to)) = self.segment.filter(|_| self.attached) else {
            return Ok(());
        };
        cr.save()?;
        cr.set_line_cap(LineCap::Round);
        for stroke in [self.border, self.core] {
            if stroke.width <= 0.0 {
                continue;
            }
            let (r, g, b, a) = Srgba::<f64>::from(stroke.color).into_components();
            cr.set_source_rgba(r, g, b, a);
            cr.set_line_width(stroke.width);
            cr.move_to(from.x, from.y);
            cr.line_to(to.x, to.y);
            cr.stroke()?;
        }
        cr.restore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ContextKind};
    use crate::gui::geometry::Direction;
    use crate::gui::menu::{self, Menu, model::tests::FixedMeasure};
    use crate::locale::Messages;
    use cairo::{Format, ImageSurface};

    fn ray() -> Ray {
        Ray::new(&RayConfig::default())
    }

    #[test]
    fn border_width_is_the_configured_width() {
        let r = ray();
        assert_eq!(r.core.width, 2.0);
        assert_eq!(r.border.width, 3.0);
        assert_eq!(r.core.color, Color::BLACK);
    }

    #[test]
    fn update_marks_previous_segment_stale() {
        let mut r = ray();
        r.attach();
        assert!(r.stale_rect().is_none());

        r.update(Point::new(10.0, 10.0), Point::new(20.0, 30.0));
        assert!(r.stale_rect().is_none());
        let first = r.dirty_rect().unwrap();
        // half the border stroke plus the margin
        assert_eq!(first.origin, Point::new(6.5, 6.5));
        assert_eq!(first.size.width, 17.0);
        assert_eq!(first.size.height, 27.0);

        r.update(Point::new(10.0, 10.0), Point::new(40.0, 10.0));
        assert_eq!(r.stale_rect(), Some(first));
    }

    #[test]
    fn detach_drops_the_segment() {
        let mut r = ray();
        r.attach();
        r.update(Point::new(0.0, 0.0), Point::new(5.0, 5.0));
        r.detach();
        assert!(!r.is_attached());
        assert!(r.segment().is_none());
        assert!(r.stale_rect().is_some());
    }

    #[test]
    fn paint_clears_stale_region() {
        let mut surface = ImageSurface::create(Format::ARgb32, 64, 64).unwrap();
        let mut r = ray();
        r.attach();
        r.update(Point::new(8.0, 8.0), Point::new(56.0, 56.0));
        {
            let cr = Context::new(&surface).unwrap();
            r.paint(&cr).unwrap();
        }
        surface.flush();
        assert!(surface.data().unwrap().iter().any(|&b| b != 0));

        r.detach();
        {
            let cr = Context::new(&surface).unwrap();
            r.paint(&cr).unwrap();
        }
        surface.flush();
        assert!(surface.data().unwrap().iter().all(|&b| b == 0));
        assert!(r.stale_rect().is_none());
    }

    #[test]
    fn zero_border_width_skips_the_border() {
        let config = RayConfig {
            border_width: 0.0,
            ..RayConfig::default()
        };
        let r = Ray::new(&config);
        assert_eq!(r.border.width, 0.0);
        assert_eq!(r.core.width, 2.0);
    }

    fn pixel(surface: &mut ImageSurface, at: Point) -> [u8; 4] {
        let stride = surface.stride() as usize;
        let offset = at.y as usize * stride + at.x as usize * 4;
        let data = surface.data().unwrap();
        [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
    }

    #[test]
    fn moving_ray_leaves_menu_layer_intact() {
        let mut m = Menu::new(
            &Config::default(),
            ContextKind::Background,
            &Messages::english(),
            &FixedMeasure,
        );
        m.set_offset(200.0, 150.0);
        m.attach();
        m.show();
        m.highlight(Some(Direction::North));
        let north = m.slot_rect(Direction::North).center();

        let mut menu_layer = ImageSurface::create(Format::ARgb32, 400, 300).unwrap();
        {
            let cr = Context::new(&menu_layer).unwrap();
            menu::draw(&cr, Some(&m), None).unwrap();
        }
        menu_layer.flush();
        let before = pixel(&mut menu_layer, north);
        assert_ne!(before, [0; 4]);

        // the first segment crosses the north item, the second moves away
        let mut ray_layer = ImageSurface::create(Format::ARgb32, 400, 300).unwrap();
        let mut r = ray();
        r.attach();
        r.update(m.anchor(), north);
        {
            let cr = Context::new(&ray_layer).unwrap();
            r.paint(&cr).unwrap();
        }
        r.update(m.anchor(), Point::new(300.0, 150.0));
        {
            let cr = Context::new(&ray_layer).unwrap();
            r.paint(&cr).unwrap();
        }
        ray_layer.flush();

        assert_eq!(pixel(&mut ray_layer, north), [0; 4]);
        assert_eq!(pixel(&mut menu_layer, north), before);
    }
}
