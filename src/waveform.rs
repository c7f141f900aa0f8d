use serde::{Deserialize, Serialize};

pub const VALUE_MAX: f64 = 100.0;

pub type PointId = u64;

/// One user-placed (time, value) sample of the waveform.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    pub id: PointId,   // creation timestamp in ms, unique within a waveform
    pub x: f64,        // time [0, x_limit]
    pub y: f64,        // value [0, VALUE_MAX]
}

/// Ordered control-point store plus the time-axis upper bound.
///
/// Points are kept sorted ascending by `x` after every mutation. Coordinates
/// are stored in domain units, so growing `x_limit` never touches them.
#[derive(Clone, Debug)]
pub struct Waveform {
    points: Vec<ControlPoint>,
    x_limit: f64,
    last_id: Option<PointId>,
}

impl Waveform {
    pub fn new(x_limit: f64) -> Self {
        Self {
            points: Vec::new(),
            x_limit,
            last_id: None,
        }
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn get(&self, id: PointId) -> Option<&ControlPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn x_limit(&self) -> f64 {
        self.x_limit
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    fn clamp_time(&self, time: f64) -> f64 {
        time.max(0.0).min(self.x_limit)
    }

    fn clamp_value(value: f64) -> f64 {
        value.max(0.0).min(VALUE_MAX)
    }

    // ids are creation timestamps; two taps in the same millisecond must still differ
    fn allocate_id(&mut self, created_ms: u64) -> PointId {
        let id = match self.last_id {
            Some(last) if created_ms <= last => last + 1,
            _ => created_ms,
        };
        self.last_id = Some(id);
        id
    }

    // stable sort: equal x keeps relative (insertion) order
    fn sort(&mut self) {
        self.points.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    pub fn add_point(&mut self, time: f64, value: f64, created_ms: u64) -> ControlPoint {
        let point = ControlPoint {
            id: self.allocate_id(created_ms),
            x: self.clamp_time(time),
            y: Self::clamp_value(value),
        };
        self.points.push(point);
        self.sort();
        point
    }

    /// Moves the point `id` to the clamped coordinates and re-sorts.
    /// Returns the updated point, or `None` if no point carries that id.
    pub fn move_point(&mut self, id: PointId, time: f64, value: f64) -> Option<ControlPoint> {
        let x = self.clamp_time(time);
        let y = Self::clamp_value(value);
        let point = self.points.iter_mut().find(|p| p.id == id)?;
        point.x = x;
        point.y = y;
        let moved = *point;
        self.sort();
        Some(moved)
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Grows the time axis. Stored coordinates are left untouched.
    pub fn extend(&mut self, increment: f64) -> f64 {
        self.x_limit += increment;
        self.x_limit
    }

    /// Linear interpolation of the value at `time`.
    ///
    /// Outside the point range the first/last pair is used, which
    /// extrapolates along the line through the two boundary points.
    /// A zero-width interval (points sharing `x`) yields the start point's value.
    pub fn interpolate(&self, time: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if self.points.len() == 1 {
            return first.y;
        }

        let (start, end) = self
            .points
            .windows(2)
            .find(|pair| time >= pair[0].x && time <= pair[1].x)
            .map(|pair| (&pair[0], &pair[1]))
            .unwrap_or((first, last));

        let width = end.x - start.x;
        if width == 0.0 {
            return start.y;
        }
        let t = (time - start.x) / width;
        start.y + t * (end.y - start.y)
    }

    /// Serializes the full point sequence as sent to the controller.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.points).unwrap_or_else(|_| "[]".to_string())
    }
}
