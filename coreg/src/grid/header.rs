//! `# KEY: value` header lines of EBSD scan-grid files.

/// Header keys the parser keeps.
pub const HEADER_KEYS: [&str; 4] = ["XSTEP", "YSTEP", "NCOLS_ODD", "NROWS"];

/// Grid geometry declared in an `.ang` header. Absent keys are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EbsdHeader {
    /// Step size along x (scan units, usually microns)
    pub x_step: Option<f64>,
    /// Step size along y
    pub y_step: Option<f64>,
    /// Number of columns on odd rows (square grids: all rows)
    pub ncols_odd: Option<f64>,
    /// Number of scan rows
    pub nrows: Option<f64>,
}

impl EbsdHeader {
    /// Look up a value by its header key.
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "XSTEP" => self.x_step,
            "YSTEP" => self.y_step,
            "NCOLS_ODD" => self.ncols_odd,
            "NROWS" => self.nrows,
            _ => None,
        }
    }

    /// Store a value for a recognised key. Returns `false` for other keys.
    pub(crate) fn set(&mut self, key: &str, value: f64) -> bool {
        let slot = match key {
            "XSTEP" => &mut self.x_step,
            "YSTEP" => &mut self.y_step,
            "NCOLS_ODD" => &mut self.ncols_odd,
            "NROWS" => &mut self.nrows,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Feed one `#` comment line into the header.
    ///
    /// The text after the marker is split on its first colon into key and
    /// value. Unrecognised keys, lines without a colon and values that are not
    /// numbers are ignored.
    pub(crate) fn accept_line(&mut self, line: &str) {
        let Some(body) = line.strip_prefix('#') else {
            return;
        };
        let Some((key, value)) = body.split_once(':') else {
            return;
        };
        let key = key.trim();
        if !HEADER_KEYS.contains(&key) {
            return;
        }
        match value.trim().parse::<f64>() {
            Ok(v) => {
                self.set(key, v);
            }
            Err(_) => tracing::debug!("Ignoring header {} with non-numeric value '{}'", key, value.trim()),
        }
    }
}
