// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Glyph outline providers
//!
//! An [`OutlineProvider`] turns a character into closed 2D profiles at a
//! requested nominal size. [`TrueTypeOutlines`] reads them from a font file
//! and [`CachedOutlines`] memoizes any provider per character.

use crate::bool2d::classify_contours;
use crate::error::{Error, Result};
use crate::profile::Profile2D;
use nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;
use std::sync::Mutex;
use ttf_parser::OutlineBuilder;

/// Segments used to flatten one quadratic or cubic curve
const CURVE_STEPS: usize = 8;

/// Closed outline of one character
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphOutline {
    /// One profile per filled region, holes attached
    pub profiles: Vec<Profile2D>,
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl GlyphOutline {
    /// Build from profiles, computing the bounding box. `None` when empty.
    pub fn from_profiles(profiles: Vec<Profile2D>) -> Option<Self> {
        if profiles.is_empty() {
            return None;
        }
        let mut min = Point2::new(f64::MAX, f64::MAX);
        let mut max = Point2::new(f64::MIN, f64::MIN);
        for profile in &profiles {
            let (pmin, pmax) = profile.bounds();
            min = Point2::new(min.x.min(pmin.x), min.y.min(pmin.y));
            max = Point2::new(max.x.max(pmax.x), max.y.max(pmax.y));
        }
        Some(Self { profiles, min, max })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Uniformly scaled copy
    pub fn scaled(&self, factor: f64) -> GlyphOutline {
        let profiles = self
            .profiles
            .iter()
            .map(|p| p.scaled_translated(factor, Vector2::zeros()))
            .collect();
        let (a, b) = (self.min.coords * factor, self.max.coords * factor);
        GlyphOutline {
            profiles,
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }
}

/// Source of glyph outlines
pub trait OutlineProvider: Send + Sync {
    /// Outline of `ch` scaled so the font's nominal size equals `size`.
    /// `None` when the character has no drawable outline.
    fn outline(&self, ch: char, size: f64) -> Option<GlyphOutline>;

    /// Whether outlines can be served yet
    fn is_ready(&self) -> bool {
        true
    }
}

impl<P: OutlineProvider + ?Sized> OutlineProvider for &P {
    fn outline(&self, ch: char, size: f64) -> Option<GlyphOutline> {
        (**self).outline(ch, size)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Outlines read from a TrueType/OpenType font.
///
/// Font units are scaled so one em equals the requested size.
pub struct TrueTypeOutlines {
    data: Vec<u8>,
    face_index: u32,
}

impl TrueTypeOutlines {
    /// Validate and keep the font bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        ttf_parser::Face::parse(&data, 0)
            .map_err(|e| Error::InvalidProfile(format!("Font parse error: {}", e)))?;
        Ok(Self {
            data,
            face_index: 0,
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index).ok()
    }
}

impl OutlineProvider for TrueTypeOutlines {
    fn outline(&self, ch: char, size: f64) -> Option<GlyphOutline> {
        let face = self.face()?;
        let glyph = face.glyph_index(ch)?;
        let scale = size / f64::from(face.units_per_em().max(1));

        let mut flattener = OutlineFlattener::new(scale);
        face.outline_glyph(glyph, &mut flattener)?;
        flattener.finish();

        GlyphOutline::from_profiles(classify_contours(flattener.contours))
    }

    fn is_ready(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Collects flattened closed contours from `ttf_parser` outline callbacks
struct OutlineFlattener {
    scale: f64,
    contours: Vec<Vec<Point2<f64>>>,
    current: Vec<Point2<f64>>,
    last: Point2<f64>,
}

impl OutlineFlattener {
    fn new(scale: f64) -> Self {
        Self {
            scale,
            contours: Vec::new(),
            current: Vec::new(),
            last: Point2::origin(),
        }
    }

    #[inline]
    fn tx(&self, x: f32, y: f32) -> Point2<f64> {
        Point2::new(f64::from(x) * self.scale, f64::from(y) * self.scale)
    }

    /// Close whatever subpath is still open
    fn finish(&mut self) {
        let mut ring = std::mem::take(&mut self.current);
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if (first - last).norm() <= f64::EPSILON {
                ring.pop();
            }
        }
        if ring.len() >= 3 {
            self.contours.push(ring);
        }
    }
}

impl OutlineBuilder for OutlineFlattener {
    fn move_to(&mut self, x: f32, y: f32) {
        self.finish();
        self.last = self.tx(x, y);
        self.current.push(self.last);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.last = self.tx(x, y);
        self.current.push(self.last);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let p0 = self.last.coords;
        let p1 = self.tx(x1, y1).coords;
        let p2 = self.tx(x, y).coords;
        for i in 1..=CURVE_STEPS {
            let t = i as f64 / CURVE_STEPS as f64;
            let mt = 1.0 - t;
            self.current
                .push(Point2::from(p0 * (mt * mt) + p1 * (2.0 * mt * t) + p2 * (t * t)));
        }
        self.last = Point2::from(p2);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.last.coords;
        let c1 = self.tx(x1, y1).coords;
        let c2 = self.tx(x2, y2).coords;
        let p3 = self.tx(x, y).coords;
        for i in 1..=CURVE_STEPS {
            let t = i as f64 / CURVE_STEPS as f64;
            let mt = 1.0 - t;
            self.current.push(Point2::from(
                p0 * (mt * mt * mt)
                    + c1 * (3.0 * mt * mt * t)
                    + c2 * (3.0 * mt * t * t)
                    + p3 * (t * t * t),
            ));
        }
        self.last = Point2::from(p3);
    }

    fn close(&mut self) {
        self.finish();
    }
}

/// Memoizes another provider's outlines per character.
///
/// Outlines are stored at unit size and scaled on lookup; shapes do not
/// depend on size, so this is invisible to callers.
pub struct CachedOutlines<P> {
    inner: P,
    cache: Mutex<FxHashMap<char, Option<GlyphOutline>>>,
}

impl<P: OutlineProvider> CachedOutlines<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of characters looked up so far
    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: OutlineProvider> OutlineProvider for CachedOutlines<P> {
    fn outline(&self, ch: char, size: f64) -> Option<GlyphOutline> {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let unit = cache
            .entry(ch)
            .or_insert_with(|| self.inner.outline(ch, 1.0))
            .clone();
        drop(cache);
        unit.map(|outline| outline.scaled(size))
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::create_rectangle;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSquares {
        calls: AtomicUsize,
    }

    impl OutlineProvider for CountingSquares {
        fn outline(&self, ch: char, size: f64) -> Option<GlyphOutline> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ch == ' ' {
                return None;
            }
            GlyphOutline::from_profiles(vec![create_rectangle(0.6 * size, size)])
        }
    }

    #[test]
    fn test_glyph_outline_bounds() {
        let outline = GlyphOutline::from_profiles(vec![create_rectangle(2.0, 4.0)]).unwrap();
        assert_relative_eq!(outline.width(), 2.0);
        assert_relative_eq!(outline.height(), 4.0);
        assert!(GlyphOutline::from_profiles(Vec::new()).is_none());
    }

    #[test]
    fn test_cache_hits_inner_once_per_char() {
        let cached = CachedOutlines::new(CountingSquares {
            calls: AtomicUsize::new(0),
        });
        let a = cached.outline('A', 10.0).unwrap();
        let b = cached.outline('A', 20.0).unwrap();
        assert!(cached.outline(' ', 10.0).is_none());
        assert!(cached.outline(' ', 10.0).is_none());

        assert_relative_eq!(a.height(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(b.width(), 12.0, epsilon = 1e-9);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cached_len(), 2);
    }

    #[test]
    fn test_flattener_closes_quad_contour() {
        let mut flattener = OutlineFlattener::new(0.5);
        flattener.move_to(0.0, 0.0);
        flattener.line_to(10.0, 0.0);
        flattener.quad_to(10.0, 10.0, 0.0, 10.0);
        flattener.close();
        assert_eq!(flattener.contours.len(), 1);
        // move + line + 8 curve steps
        assert_eq!(flattener.contours[0].len(), 10);
        assert_relative_eq!(flattener.contours[0][1].x, 5.0);
    }

    #[test]
    fn test_invalid_font_rejected() {
        assert!(TrueTypeOutlines::from_bytes(vec![0, 1, 2, 3]).is_err());
    }
}
