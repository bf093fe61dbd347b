//! Movie fragments (`moof` + `mdat` pairs).
//!
//! The timing fields of a fragment live in the `traf` box of its `moof`:
//!
//! ```text
//! moof
//! ├── mfhd
//! └── traf
//!     ├── tfhd   "default sample duration", "track ID"
//!     ├── tfdt   "base media decode time"
//!     └── trun   "sample count"
//! ```
//!
//! This is the layout `mp4dump` emits for single-track fragmented MP4. Boxes
//! are looked up by name (first match), and any box or field missing from
//! this layout is reported as
//! [`VvizError::UnexpectedBoxLayout`]. This is not a general MP4 parser.

use chrono::{DateTime, TimeDelta, Utc};

use crate::boxes::BoxNode;
use crate::error::VvizError;
use crate::rational::Rational;
use crate::track::Track;
use crate::utilities::{add_delta, micros_to_datetime, micros_to_delta};

/// One `moof`/`mdat` pair of a [`Track`].
///
/// The fragment carries the owning track's id and time scale, kept in step
/// by the track. Time-based values need a non-zero time scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    track_id: Option<u32>,
    time_scale: Option<u64>,
    moof: BoxNode,
    mdat: BoxNode,
    position: usize,
    decode_time: u64,
    sample_count: u64,
    default_sample_duration: u64,
    data_size: u64,
    declared_track_id: Option<u32>,
}

impl Fragment {
    /// Pair a `moof` with its `mdat`.
    ///
    /// # Errors
    ///
    /// [`VvizError::UnexpectedBoxLayout`] if `moof` lacks the `traf` /
    /// `tfhd` / `tfdt` / `trun` boxes or their fields, or `mdat` has no size.
    pub fn new(
        moof: BoxNode,
        mdat: BoxNode,
        track: &Track,
        position: usize,
    ) -> Result<Self, VvizError> {
        let path = format!("moof {position}");
        let traf = moof.require_child(&path, "traf")?;
        let traf_path = format!("{path}/traf");

        let tfhd = traf.require_child(&traf_path, "tfhd")?;
        let tfdt = traf.require_child(&traf_path, "tfdt")?;
        let trun = traf.require_child(&traf_path, "trun")?;

        let default_sample_duration =
            tfhd.require_u64(&format!("{traf_path}/tfhd"), "default sample duration")?;
        let decode_time = tfdt.require_u64(&format!("{traf_path}/tfdt"), "base media decode time")?;
        let sample_count = trun.require_u64(&format!("{traf_path}/trun"), "sample count")?;
        let declared_track_id = tfhd
            .field_u64("track ID")
            .and_then(|id| u32::try_from(id).ok());
        let mdat_path = format!("mdat {position}");
        let data_size = mdat.require_size(&mdat_path)?;
        if data_size.checked_mul(8).is_none() {
            return Err(VvizError::UnexpectedBoxLayout {
                path: mdat_path,
                expected: "a `size` that fits in 64 bits as a bit count".to_string(),
            });
        }

        Ok(Self {
            track_id: track.id(),
            time_scale: track.time_scale(),
            moof,
            mdat,
            position,
            decode_time,
            sample_count,
            default_sample_duration,
            data_size,
            declared_track_id,
        })
    }

    /// 1-based position within the track.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Id of the owning track.
    pub fn track_id(&self) -> Option<u32> {
        self.track_id
    }

    pub(crate) fn set_track_id(&mut self, track_id: Option<u32>) {
        self.track_id = track_id;
    }

    /// The `track ID` declared in this fragment's `tfhd`, if any.
    pub fn declared_track_id(&self) -> Option<u32> {
        self.declared_track_id
    }

    pub fn time_scale(&self) -> Option<u64> {
        self.time_scale
    }

    pub(crate) fn set_time_scale(&mut self, time_scale: Option<u64>) {
        self.time_scale = time_scale;
    }

    pub fn moof(&self) -> &BoxNode {
        &self.moof
    }

    pub fn mdat(&self) -> &BoxNode {
        &self.mdat
    }

    /// `tfdt` base media decode time, in time-scale ticks.
    pub fn decode_time(&self) -> u64 {
        self.decode_time
    }

    /// `tfhd` default sample duration, in time-scale ticks.
    pub fn default_sample_duration(&self) -> u64 {
        self.default_sample_duration
    }

    /// Number of samples (`trun` sample count).
    pub fn len(&self) -> u64 {
        self.sample_count
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Media data size in bits (`mdat` size × 8).
    pub fn size(&self) -> u64 {
        self.data_size * 8
    }

    /// Decode time as an offset from the start of the timeline.
    pub fn start_offset(&self) -> Result<TimeDelta, VvizError> {
        Ok(micros_to_delta(self.ticks_to_micros(self.decode_time)?))
    }

    /// Decode time as an instant on the UTC epoch clock.
    pub fn start_time(&self) -> Result<DateTime<Utc>, VvizError> {
        micros_to_datetime(self.ticks_to_micros(self.decode_time)?, &self.entity())
    }

    /// `default sample duration × sample count / time scale`.
    pub fn duration(&self) -> Result<TimeDelta, VvizError> {
        let ticks = self
            .default_sample_duration
            .checked_mul(self.sample_count)
            .ok_or_else(|| VvizError::TimestampOutOfRange {
                entity: self.entity(),
                micros: i128::MAX,
            })?;
        Ok(micros_to_delta(self.ticks_to_micros(ticks)?))
    }

    pub fn end_time(&self) -> Result<DateTime<Utc>, VvizError> {
        add_delta(self.start_time()?, self.duration()?, &self.entity())
    }

    fn entity(&self) -> String {
        format!("fragment {}", self.position)
    }

    fn ticks_to_micros(&self, ticks: u64) -> Result<i128, VvizError> {
        let time_scale = self
            .time_scale
            .filter(|scale| *scale > 0)
            .and_then(|scale| i64::try_from(scale).ok())
            .and_then(|scale| Rational::new(1, scale))
            .ok_or_else(|| VvizError::MissingConfiguration {
                entity: self.entity(),
                setting: "time scale",
            })?;
        let ticks = i64::try_from(ticks).map_err(|_| VvizError::TimestampOutOfRange {
            entity: self.entity(),
            micros: i128::from(ticks),
        })?;
        Ok(time_scale.ticks_to_micros(ticks))
    }
}
