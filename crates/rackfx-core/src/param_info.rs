//! Runtime-discoverable unit parameters.
//!
//! A unit exposes its controls through [`ParameterInfo`]: a count, a
//! [`ParamDescriptor`] per index, and plain-value get/set. The processor
//! mirrors these values into atomics so control threads can write them
//! while the audio thread runs, and its state blob keys every value by the
//! descriptor's [`ParamId`] rather than by index.
//!
//! Units normally get the trait from [`impl_params!`](crate::impl_params);
//! a hand-written impl looks like this:
//!
//! ```rust
//! use rackfx_core::{ParamDescriptor, ParamId, ParameterInfo};
//!
//! struct Trim {
//!     db: f32,
//! }
//!
//! impl ParameterInfo for Trim {
//!     fn param_count(&self) -> usize {
//!         1
//!     }
//!
//!     fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
//!         (index == 0).then(|| {
//!             ParamDescriptor::gain_db("Trim", "Trim", -24.0, 24.0, 0.0)
//!                 .with_id(ParamId(9100), "trim_db")
//!         })
//!     }
//!
//!     fn get_param(&self, index: usize) -> f32 {
//!         if index == 0 { self.db } else { 0.0 }
//!     }
//!
//!     fn set_param(&mut self, index: usize, value: f32) {
//!         if let Some(desc) = self.param_info(index) {
//!             self.db = desc.clamp(value);
//!         }
//!     }
//! }
//!
//! let mut trim = Trim { db: 0.0 };
//! trim.set_param(0, 30.0);
//! assert_eq!(trim.get_param(0), 24.0);
//! ```

#[cfg(not(feature = "std"))]
use alloc::{format, string::String};

/// Identifier a parameter keeps for as long as saved state may refer to it.
///
/// Units take a block of a hundred (gain 100, clipper 200, ladder 300...)
/// and number their parameters upward from its base. Indices may be
/// reshuffled between releases; ids may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub u32);

/// Index-addressed parameter access.
///
/// Indices run `0..param_count()` and stay fixed for an instance's
/// lifetime. Nothing here is synchronised; see the processor for how values
/// cross threads.
pub trait ParameterInfo {
    /// Number of parameters.
    fn param_count(&self) -> usize;

    /// Descriptor at `index`, `None` past the end.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Plain value at `index`, `0.0` past the end.
    fn get_param(&self, index: usize) -> f32;

    /// Sets the plain value at `index`, clamped by its descriptor. Indices
    /// past the end are ignored.
    fn set_param(&mut self, index: usize, value: f32);

    /// Index of the parameter carrying `id`. Linear scan.
    fn param_index_by_id(&self, id: ParamId) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.id == id))
    }
}

/// Range, default and display metadata for one parameter.
///
/// ```rust
/// use rackfx_core::{ParamDescriptor, ParamId};
///
/// let time = ParamDescriptor::time_ms("Delay Time", "Time", 1.0, 2000.0, 250.0)
///     .with_id(ParamId(500), "dly_time");
/// assert_eq!(time.clamp(5000.0), 2000.0);
/// assert_eq!(time.format_value(250.0), "250.0 ms");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Abbreviation for narrow columns, eight characters at most.
    pub short_name: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
    /// Value a fresh unit starts with.
    pub default: f32,
    /// Stable id, `ParamId(0)` until assigned.
    pub id: ParamId,
    /// Stable snake_case key, accepted wherever a parameter is named.
    pub key: &'static str,
    /// Whole numbers only (modes, bit depths, sample counts).
    pub stepped: bool,
}

impl ParamDescriptor {
    /// Unitless parameter over `min..=max`.
    pub const fn custom(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min,
            max,
            default,
            id: ParamId(0),
            key: "",
            stepped: false,
        }
    }

    /// 0–100 %.
    pub const fn percent(name: &'static str, short_name: &'static str, default: f32) -> Self {
        Self::custom(name, short_name, 0.0, 100.0, default).with_unit(ParamUnit::Percent)
    }

    /// Feedback amount, 0–95 % so loops always decay. Defaults to 35 %.
    pub const fn feedback() -> Self {
        let mut desc = Self::percent("Feedback", "Fdbk", 35.0);
        desc.max = 95.0;
        desc
    }

    /// Milliseconds over `min..=max`.
    pub const fn time_ms(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::custom(name, short_name, min, max, default).with_unit(ParamUnit::Milliseconds)
    }

    /// Decibels over `min..=max`.
    pub const fn gain_db(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::custom(name, short_name, min, max, default).with_unit(ParamUnit::Decibels)
    }

    /// Hertz over `min..=max`.
    pub const fn frequency_hz(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::custom(name, short_name, min, max, default).with_unit(ParamUnit::Hertz)
    }

    /// Assigns the stable id and key.
    pub const fn with_id(mut self, id: ParamId, key: &'static str) -> Self {
        self.id = id;
        self.key = key;
        self
    }

    /// Replaces the display unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Restricts the parameter to whole numbers.
    pub const fn stepped(mut self) -> Self {
        self.stepped = true;
        self
    }

    /// Whether `name` refers to this parameter: its name, short name or
    /// key, ignoring ASCII case.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        [self.name, self.short_name, self.key]
            .iter()
            .any(|candidate| !candidate.is_empty() && candidate.eq_ignore_ascii_case(name))
    }

    /// Brings `value` into range. Stepped parameters round to the nearest
    /// whole number first; NaN becomes the default.
    ///
    /// ```rust
    /// use rackfx_core::ParamDescriptor;
    ///
    /// let bits = ParamDescriptor::custom("Bits", "Bits", 2.0, 16.0, 8.0).stepped();
    /// assert_eq!(bits.clamp(4.6), 5.0);
    /// assert_eq!(bits.clamp(40.0), 16.0);
    /// assert_eq!(bits.clamp(f32::NAN), 8.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let value = if self.stepped {
            libm::roundf(value)
        } else {
            value
        };
        value.clamp(self.min, self.max)
    }

    /// Plain value at `position` (0 to 1) along a linear sweep of the range.
    #[inline]
    pub fn denormalize(&self, position: f32) -> f32 {
        self.min + position * (self.max - self.min)
    }

    /// Formats a value for display with its unit.
    ///
    /// ```rust
    /// use rackfx_core::ParamDescriptor;
    ///
    /// let cutoff = ParamDescriptor::frequency_hz("Cutoff", "Cutoff", 20.0, 20000.0, 1000.0);
    /// assert_eq!(cutoff.format_value(440.0), "440 Hz");
    /// assert_eq!(cutoff.format_value(2500.0), "2.50 kHz");
    /// ```
    pub fn format_value(&self, value: f32) -> String {
        match self.unit {
            ParamUnit::Decibels => format!("{value:.1} dB"),
            ParamUnit::Hertz if value >= 1000.0 => format!("{:.2} kHz", value / 1000.0),
            ParamUnit::Hertz => format!("{value:.0} Hz"),
            ParamUnit::Milliseconds => format!("{value:.1} ms"),
            ParamUnit::Percent => format!("{value:.0}%"),
            ParamUnit::Ratio => format!("{value:.2}:1"),
            ParamUnit::Samples => format!("{value:.0} smp"),
            ParamUnit::None if self.stepped => format!("{value:.0}"),
            ParamUnit::None => format!("{value:.2}"),
        }
    }

    /// Parses display text back into a clamped value.
    ///
    /// Accepts a bare number or one followed by a unit suffix
    /// (`dB`, `Hz`, `kHz`, `ms`, `s`, `%`, `:1`, `smp`), case-insensitive.
    ///
    /// ```rust
    /// use rackfx_core::ParamDescriptor;
    ///
    /// let cutoff = ParamDescriptor::frequency_hz("Cutoff", "Cutoff", 20.0, 20000.0, 1000.0);
    /// assert_eq!(cutoff.parse_value("2.5 kHz"), Some(2500.0));
    /// assert_eq!(cutoff.parse_value("abc"), None);
    /// ```
    pub fn parse_value(&self, text: &str) -> Option<f32> {
        let text = text.trim();
        let lower = text.to_ascii_lowercase();
        let (number, scale) = [
            ("khz", 1000.0),
            ("hz", 1.0),
            ("db", 1.0),
            ("ms", 1.0),
            ("smp", 1.0),
            (":1", 1.0),
            ("%", 1.0),
            ("s", 1000.0),
        ]
        .iter()
        .find_map(|&(suffix, scale)| {
            lower
                .strip_suffix(suffix)
                .map(|rest| (rest.trim_end(), scale))
        })
        .unwrap_or((lower.as_str(), 1.0));

        // Seconds only make sense for millisecond parameters.
        let scale = if scale == 1000.0 && lower.ends_with('s') && !lower.ends_with("ms") {
            if self.unit == ParamUnit::Milliseconds { 1000.0 } else { return None }
        } else {
            scale
        };

        let value: f32 = number.parse().ok()?;
        value.is_finite().then(|| self.clamp(value * scale))
    }
}

/// How a parameter's value is printed and which suffixes parse back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// `dB`.
    Decibels,
    /// `Hz`, switching to `kHz` from 1000 up.
    Hertz,
    /// `ms`; text in seconds is accepted too.
    Milliseconds,
    /// `%`.
    Percent,
    /// `n:1`.
    Ratio,
    /// Whole samples.
    Samples,
    /// Bare number.
    None,
}

/// Implements [`ParameterInfo`] from a table of descriptors and accessors.
///
/// Each row names the index, the descriptor expression, a getter expression,
/// and a setter closure-like body receiving the already clamped value.
///
/// ```rust
/// use rackfx_core::{ParamDescriptor, ParamId, ParameterInfo};
///
/// struct Trim { db: f32 }
///
/// rackfx_core::impl_params! {
///     Trim, this {
///         [0] ParamDescriptor::gain_db("Trim", "Trim", -12.0, 12.0, 0.0)
///                 .with_id(ParamId(9000), "trim_db"),
///             get: this.db,
///             set: |v| this.db = v;
///     }
/// }
///
/// let mut trim = Trim { db: 0.0 };
/// trim.set_param(0, 40.0);
/// assert_eq!(trim.get_param(0), 12.0);
/// ```
#[macro_export]
macro_rules! impl_params {
    (
        $ty:ty, $this:ident {
            $(
                [$idx:literal] $desc:expr,
                    get: $get:expr,
                    set: |$v:ident| $set:expr;
            )+
        }
    ) => {
        impl $crate::ParameterInfo for $ty {
            fn param_count(&self) -> usize {
                0 $( + { let _ = $idx; 1 } )+
            }

            fn param_info(&self, index: usize) -> Option<$crate::ParamDescriptor> {
                match index {
                    $( $idx => Some($desc), )+
                    _ => None,
                }
            }

            fn get_param(&self, index: usize) -> f32 {
                let $this = self;
                match index {
                    $( $idx => $get, )+
                    _ => 0.0,
                }
            }

            fn set_param(&mut self, index: usize, value: f32) {
                let Some(desc) = $crate::ParameterInfo::param_info(self, index) else {
                    return;
                };
                let $this = self;
                match index {
                    $(
                        $idx => {
                            let $v = desc.clamp(value);
                            $set;
                        }
                    )+
                    _ => {}
                }
            }
        }
    };
}
