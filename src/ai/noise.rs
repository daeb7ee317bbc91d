use rand::rngs::{SmallRng, StdRng};
use rand::Rng;

/// 叶子评估的随机源，可注入以便测试确定化。
pub trait NoiseSource {
    /// Draws an integer uniformly from `low..=high`.
    fn draw(&mut self, low: i32, high: i32) -> i32;
}

impl NoiseSource for SmallRng {
    fn draw(&mut self, low: i32, high: i32) -> i32 {
        self.gen_range(low..=high)
    }
}

impl NoiseSource for StdRng {
    fn draw(&mut self, low: i32, high: i32) -> i32 {
        self.gen_range(low..=high)
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for &mut N {
    fn draw(&mut self, low: i32, high: i32) -> i32 {
        (**self).draw(low, high)
    }
}

/// Replays a fixed list of draws, cycling when it runs out.
#[derive(Debug, Clone)]
pub struct ScriptedNoise {
    values: Vec<i32>,
    cursor: usize,
}

impl ScriptedNoise {
    pub fn new(values: Vec<i32>) -> Self {
        assert!(!values.is_empty(), "scripted noise needs at least one value");
        Self { values, cursor: 0 }
    }

    pub fn constant(value: i32) -> Self {
        Self::new(vec![value])
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl NoiseSource for ScriptedNoise {
    fn draw(&mut self, low: i32, high: i32) -> i32 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(low, high)
    }
}
