use crate::cache::Handle;
use crate::geometry::Point;

use super::VideoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    pub image: Handle,
    pub shift: Point,
}

impl AnimationFrame {
    pub fn new(image: Handle, shift: Point) -> Self {
        Self { image, shift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayDirection {
    Forward,
    Backward,
}

/// Frame sequence that bounces between its first and last frame.
///
/// Frames are cache handles; the animation never owns the images it shows.
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<AnimationFrame>,
    frame_duration: u64,
    current: usize,
    direction: PlayDirection,
    last_change: u64,
    active: bool,
    shift: Point,
}

impl Animation {
    pub fn new(frames: Vec<AnimationFrame>, frame_duration: u64) -> Result<Self, VideoError> {
        if frames.is_empty() {
            return Err(VideoError::NoFrames);
        }
        Ok(Self {
            frames,
            frame_duration,
            current: 0,
            direction: PlayDirection::Forward,
            last_change: 0,
            active: true,
            shift: Point::ZERO,
        })
    }

    /// Animation with `count` undefined frames, to be filled with `set_frame`.
    pub fn with_frame_count(count: usize, frame_duration: u64) -> Result<Self, VideoError> {
        Self::new(
            vec![AnimationFrame::new(Handle::UNDEFINED, Point::ZERO); count],
            frame_duration,
        )
    }

    pub fn with_shift(mut self, shift: Point) -> Self {
        self.shift = shift;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<AnimationFrame> {
        self.frames.get(index).copied()
    }

    pub fn set_frame(&mut self, index: usize, frame: AnimationFrame) -> Result<(), VideoError> {
        let count = self.frames.len();
        let slot = self
            .frames
            .get_mut(index)
            .ok_or(VideoError::IndexOutOfRange { index, count })?;
        *slot = frame;
        Ok(())
    }

    pub fn current_frame_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> AnimationFrame {
        self.frames[self.current]
    }

    pub fn set_current_frame(&mut self, index: usize) -> Result<(), VideoError> {
        if index >= self.frames.len() {
            return Err(VideoError::IndexOutOfRange {
                index,
                count: self.frames.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    pub fn direction(&self) -> PlayDirection {
        self.direction
    }

    /// Restarts playback from the end the new direction starts at.
    pub fn set_direction(&mut self, direction: PlayDirection) {
        self.direction = direction;
        self.current = match direction {
            PlayDirection::Forward => 0,
            PlayDirection::Backward => self.frames.len() - 1,
        };
    }

    pub fn frame_duration(&self) -> u64 {
        self.frame_duration
    }

    pub fn set_frame_duration(&mut self, frame_duration: u64) {
        self.frame_duration = frame_duration;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn shift(&self) -> Point {
        self.shift
    }

    pub fn set_shift(&mut self, shift: Point) {
        self.shift = shift;
    }

    pub fn update(&mut self, now_ticks: u64) {
        if !self.active {
            return;
        }
        if now_ticks.saturating_sub(self.last_change) < self.frame_duration {
            return;
        }
        self.last_change = now_ticks;
        self.step();
    }

    fn step(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        let last = self.frames.len() - 1;
        match self.direction {
            PlayDirection::Forward if self.current < last => self.current += 1,
            PlayDirection::Forward => {
                self.direction = PlayDirection::Backward;
                self.current -= 1;
            }
            PlayDirection::Backward if self.current > 0 => self.current -= 1,
            PlayDirection::Backward => {
                self.direction = PlayDirection::Forward;
                self.current += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animation(count: u32, duration: u64) -> Animation {
        let frames = (1..=count)
            .map(|raw| AnimationFrame::new(Handle::from_raw(raw), Point::ZERO))
            .collect();
        Animation::new(frames, duration).expect("animation")
    }

    #[test]
    fn oscillates_back_to_first_frame() {
        for count in 2..7u32 {
            let mut anim = animation(count, 100);
            let period = 2 * (count as u64 - 1);
            let mut seen_last = false;
            for step in 1..=period {
                anim.update(step * 100);
                assert!(anim.current_frame_index() < count as usize);
                seen_last |= anim.current_frame_index() == count as usize - 1;
            }
            assert!(seen_last, "count={count}");
            assert_eq!(anim.current_frame_index(), 0, "count={count}");
        }
    }

    #[test]
    fn ping_pong_sequence_for_three_frames() {
        let mut anim = animation(3, 10);
        let mut indices = Vec::new();
        for step in 1..=6u64 {
            anim.update(step * 10);
            indices.push(anim.current_frame_index());
        }
        assert_eq!(indices, vec![1, 2, 1, 0, 1, 2]);
    }

    #[test]
    fn update_waits_for_frame_duration() {
        let mut anim = animation(3, 100);
        anim.update(99);
        assert_eq!(anim.current_frame_index(), 0);
        anim.update(100);
        assert_eq!(anim.current_frame_index(), 1);
        anim.update(150);
        assert_eq!(anim.current_frame_index(), 1);
    }

    #[test]
    fn single_frame_stays_put() {
        let mut anim = animation(1, 0);
        for now in 0..5 {
            anim.update(now);
            assert_eq!(anim.current_frame_index(), 0);
        }
    }

    #[test]
    fn out_of_range_frame_access_fails() {
        let mut anim = animation(2, 10);
        assert_eq!(
            anim.set_current_frame(2),
            Err(VideoError::IndexOutOfRange { index: 2, count: 2 })
        );
        assert!(anim
            .set_frame(5, AnimationFrame::new(Handle::UNDEFINED, Point::ZERO))
            .is_err());
        anim.set_current_frame(1).expect("valid index");
        assert_eq!(anim.current_frame().image, Handle::from_raw(2));
    }

    #[test]
    fn empty_animation_is_rejected() {
        assert_eq!(
            Animation::new(Vec::new(), 10).expect_err("no frames"),
            VideoError::NoFrames
        );
    }

    #[test]
    fn inactive_animation_does_not_advance() {
        let mut anim = animation(3, 10);
        anim.set_active(false);
        anim.update(1_000);
        assert_eq!(anim.current_frame_index(), 0);
    }
}
