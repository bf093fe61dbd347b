//! Container tracks reconstructed from a box dump.
//!
//! [`Track::from_boxes`] makes two passes over the top-level box list:
//!
//! 1. Track information: the nominal duration from `moov/mvhd`
//!    (`duration / timescale`) and the time scale of fragment timestamps from
//!    `sidx`. When a box appears more than once, the last one wins.
//! 2. Fragments: each `moof` is paired with the next `mdat`. A `moof` that is
//!    followed by another `moof` (or by nothing) is dropped; an `mdat` with no
//!    pending `moof` is not fragmented content and is skipped.

use chrono::{DateTime, TimeDelta, Utc};

use crate::boxes::BoxNode;
use crate::error::VvizError;
use crate::fragment::Fragment;
use crate::rational::Rational;
use crate::utilities::micros_to_delta;

/// One container track and its fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    id: Option<u32>,
    time_scale: Option<u64>,
    duration: Option<TimeDelta>,
    fragments: Vec<Fragment>,
}

impl Track {
    /// A bare track with an id, no time scale and no fragments.
    pub fn new(id: u32) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Reduce a top-level box list into a track.
    ///
    /// When `id` is `None`, the `track ID` of the first fragment's `tfhd` is
    /// used.
    ///
    /// # Errors
    ///
    /// [`VvizError::UnexpectedBoxLayout`] if a `moov`, `sidx` or `moof` does
    /// not have the expected layout.
    pub fn from_boxes(id: Option<u32>, boxes: &[BoxNode]) -> Result<Self, VvizError> {
        log::debug!("Reducing {} top-level boxes into track {:?}", boxes.len(), id);

        let mut track = Self {
            id,
            ..Self::default()
        };
        track.read_track_info(boxes)?;
        track.fragments = track.collect_fragments(boxes)?;

        if track.id.is_none() {
            track.id = track
                .fragments
                .first()
                .and_then(Fragment::declared_track_id);
            for fragment in &mut track.fragments {
                fragment.set_track_id(track.id);
            }
        }

        log::info!(
            "Track {:?}: time scale {:?}, {} fragments",
            track.id,
            track.time_scale,
            track.fragments.len()
        );
        Ok(track)
    }

    fn read_track_info(&mut self, boxes: &[BoxNode]) -> Result<(), VvizError> {
        for node in boxes {
            if node.is("moov") {
                let mvhd = node.require_child("moov", "mvhd")?;
                let duration = mvhd.require_u64("moov/mvhd", "duration")?;
                let timescale = mvhd.require_u64("moov/mvhd", "timescale")?;
                let seconds_per_tick = i64::try_from(timescale)
                    .ok()
                    .and_then(|scale| Rational::new(1, scale))
                    .ok_or_else(|| VvizError::UnexpectedBoxLayout {
                        path: "moov/mvhd".to_string(),
                        expected: "a non-zero `timescale`".to_string(),
                    })?;
                let ticks = i64::try_from(duration).unwrap_or(i64::MAX);
                self.duration = Some(micros_to_delta(seconds_per_tick.ticks_to_micros(ticks)));
            }

            if node.is("sidx") {
                self.time_scale = Some(node.require_u64("sidx", "timescale")?);
            }
        }
        Ok(())
    }

    fn collect_fragments(&self, boxes: &[BoxNode]) -> Result<Vec<Fragment>, VvizError> {
        let mut fragments = Vec::new();
        let mut pending: Option<&BoxNode> = None;

        for node in boxes {
            if node.is("moof") {
                if pending.is_some() {
                    log::warn!(
                        "Dropping moof without mdat before fragment {}",
                        fragments.len() + 1
                    );
                }
                pending = Some(node);
            } else if node.is("mdat") {
                match pending.take() {
                    Some(moof) => {
                        let position = fragments.len() + 1;
                        fragments.push(Fragment::new(moof.clone(), node.clone(), self, position)?);
                    }
                    None => log::debug!("Skipping mdat without a preceding moof"),
                }
            }
        }

        if pending.is_some() {
            log::warn!("Dropping trailing moof without mdat");
        }
        Ok(fragments)
    }

    pub fn id(&self) -> Option<u32> {
        self.id
    }

    /// Ticks per second of fragment decode times (from `sidx`).
    pub fn time_scale(&self) -> Option<u64> {
        self.time_scale
    }

    /// Set the time scale of the track and of every fragment it holds.
    pub fn set_time_scale(&mut self, time_scale: u64) {
        self.time_scale = Some(time_scale);
        for fragment in &mut self.fragments {
            fragment.set_time_scale(self.time_scale);
        }
    }

    #[must_use]
    pub fn with_time_scale(mut self, time_scale: u64) -> Self {
        self.set_time_scale(time_scale);
        self
    }

    /// Nominal duration (from `moov/mvhd`).
    pub fn duration(&self) -> Option<TimeDelta> {
        self.duration
    }

    pub fn set_duration(&mut self, duration: TimeDelta) {
        self.duration = Some(duration);
    }

    /// Fragments in box-list order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// `true` if the dump contained at least one `moof`/`mdat` pair.
    pub fn is_fragmented(&self) -> bool {
        !self.fragments.is_empty()
    }

    /// Fragments that overlap the window `(start, end)`.
    pub fn fragments_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<&Fragment>, VvizError> {
        let mut selected = Vec::new();
        for fragment in &self.fragments {
            if fragment.start_time()? < end && fragment.end_time()? > start {
                selected.push(fragment);
            }
        }
        Ok(selected)
    }

    /// Fragment durations measured between successive decode times rather
    /// than from the sample counts. The last fragment runs to the end of the
    /// track, or keeps its sample-count duration when the track has no
    /// nominal duration.
    pub fn measured_fragment_durations(&self) -> Result<Vec<TimeDelta>, VvizError> {
        let mut durations = Vec::with_capacity(self.fragments.len());
        for pair in self.fragments.windows(2) {
            durations.push(pair[1].start_offset()? - pair[0].start_offset()?);
        }

        if let Some(last) = self.fragments.last() {
            let tail = match self.duration {
                Some(total) => total - last.start_offset()?,
                None => last.duration()?,
            };
            durations.push(tail);
        }
        Ok(durations)
    }
}
