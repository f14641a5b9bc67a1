use std::{thread, time::Duration};

/// A patch-based animation: a base frame plus a rule for advancing a
/// working frame one step at a time. The cursor carries whatever playback
/// position the concrete animation needs.
pub trait Animation {
    type Frame;
    type Cursor;

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Builds a fresh working frame and playback cursor.
    fn init(&self) -> (Self::Frame, Self::Cursor);

    /// Advances the working frame by one animation step.
    fn advance(&self, frame: &mut Self::Frame, cursor: &mut Self::Cursor);

    /// The delay before the next step, in animation time units.
    fn next_delay(&self, cursor: &Self::Cursor) -> u32;
}

/// Default playback speed in milliseconds per animation time unit.
const DEFAULT_SPEED: u64 = 50;

/// Plays an [`Animation`] by advancing a working frame. The player either
/// steps manually through [`Player::next`] or runs a blocking timer loop
/// through [`Player::play`].
pub struct Player<A: Animation> {
    animation: A,
    frame: A::Frame,
    cursor: A::Cursor,
    speed: u64,
    running: bool,
}

impl<A: Animation> Player<A> {
    pub fn new(animation: A) -> Self {
        let (frame, cursor) = animation.init();
        Self {
            animation,
            frame,
            cursor,
            speed: DEFAULT_SPEED,
            running: false,
        }
    }

    pub fn animation(&self) -> &A {
        &self.animation
    }

    /// The current working frame.
    pub fn frame(&self) -> &A::Frame {
        &self.frame
    }

    pub fn width(&self) -> usize {
        self.animation.width()
    }

    pub fn height(&self) -> usize {
        self.animation.height()
    }

    /// The playback speed in milliseconds per time unit.
    pub fn speed(&self) -> u64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: u64) {
        self.speed = speed;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances the animation by exactly one step.
    pub fn next(&mut self) {
        self.animation.advance(&mut self.frame, &mut self.cursor);
    }

    /// The wall-clock delay before the next step.
    pub fn next_delay(&self) -> Duration {
        Duration::from_millis(self.animation.next_delay(&self.cursor) as u64 * self.speed)
    }

    /// Stops the timer loop after the current step.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stops playback and reinitializes the working frame from the base.
    pub fn reset(&mut self) {
        self.stop();
        let (frame, cursor) = self.animation.init();
        self.frame = frame;
        self.cursor = cursor;
    }

    /// Runs the blocking timer loop: sleep for the current delay, advance
    /// one step and hand the frame to the draw callback. Playback ends when
    /// the callback returns `false` or [`Player::stop`] was called from it.
    /// Calling `play` while already running returns immediately.
    pub fn play<F>(&mut self, mut on_draw: F)
    where
        F: FnMut(&A::Frame) -> bool,
    {
        if self.running {
            return;
        }
        self.running = true;
        while self.running {
            thread::sleep(self.next_delay());
            self.next();
            if !on_draw(&self.frame) {
                self.running = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        delays: Vec<u32>,
    }

    impl Animation for Counter {
        type Frame = u32;
        type Cursor = usize;

        fn width(&self) -> usize {
            1
        }

        fn height(&self) -> usize {
            1
        }

        fn init(&self) -> (u32, usize) {
            (0, 0)
        }

        fn advance(&self, frame: &mut u32, cursor: &mut usize) {
            *frame += 1;
            *cursor = (*cursor + 1) % self.delays.len();
        }

        fn next_delay(&self, cursor: &usize) -> u32 {
            self.delays[*cursor]
        }
    }

    fn counter() -> Player<Counter> {
        Player::new(Counter {
            delays: vec![2, 4, 8],
        })
    }

    #[test]
    fn next_advances_one_step() {
        let mut player = counter();
        assert_eq!(*player.frame(), 0);
        player.next();
        player.next();
        assert_eq!(*player.frame(), 2);
    }

    #[test]
    fn delay_scales_with_speed() {
        let mut player = counter();
        assert_eq!(player.next_delay(), Duration::from_millis(100));
        player.next();
        assert_eq!(player.next_delay(), Duration::from_millis(200));
        player.set_speed(10);
        assert_eq!(player.next_delay(), Duration::from_millis(40));
    }

    #[test]
    fn reset_restores_the_base_frame() {
        let mut player = counter();
        player.next();
        player.next();
        player.reset();
        assert_eq!(*player.frame(), 0);
        assert_eq!(player.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn play_runs_until_the_callback_ends_it() {
        let mut player = counter();
        player.set_speed(0);
        let mut drawn = 0;
        player.play(|_| {
            drawn += 1;
            drawn < 5
        });
        assert_eq!(drawn, 5);
        assert_eq!(*player.frame(), 5);
        assert!(!player.is_running());
    }
}
