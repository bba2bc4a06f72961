use rand::Rng;

/// Width/height pair in play-area units (pixels, terminal cells, ...)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Top-left corner of a target inside the play area
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub value: u32,
    pub position: Position,
}

/// Scatters targets uniformly over the play area.
///
/// Targets may overlap; nothing here tries to keep them apart. The generator
/// keeps no state between calls, every layout is independent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutGenerator {
    area: Size,
    target: Size,
    margin: f64,
}

impl LayoutGenerator {
    pub fn new(area: Size, target: Size, margin: f64) -> Self {
        Self {
            area,
            target,
            margin,
        }
    }

    /// Largest x a target may start at; 0 when the area is too narrow
    pub fn max_x(&self) -> f64 {
        (self.area.width - self.target.width - self.margin).max(0.0)
    }

    /// Largest y a target may start at; 0 when the area is too short
    pub fn max_y(&self) -> f64 {
        (self.area.height - self.target.height - self.margin).max(0.0)
    }

    pub fn generate<R: Rng + ?Sized>(&self, count: u32, rng: &mut R) -> Vec<Placement> {
        let (max_x, max_y) = (self.max_x(), self.max_y());

        (1..=count)
            .map(|value| Placement {
                value,
                position: Position::new(random_coord(rng, max_x), random_coord(rng, max_y)),
            })
            .collect()
    }
}

fn random_coord<R: Rng + ?Sized>(rng: &mut R, max: f64) -> f64 {
    if max > 0.0 {
        rng.gen_range(0.0..=max)
    } else {
        0.0
    }
}
