//! Sources d'échantillons simples pour le front-end de démonstration

use super::traits::SampleSource;

/// Source muette
#[derive(Debug, Default, Clone, Copy)]
pub struct SilenceSource;

impl SampleSource for SilenceSource {
    fn produce_samples(&mut self, count: usize, out: &mut [i16]) {
        out[..count * 2].fill(0);
    }
}

/// Source rejouant un motif stéréo en boucle
#[derive(Debug, Clone)]
pub struct PatternSource {
    pattern: Vec<(i16, i16)>,
    position: usize,
}

impl PatternSource {
    pub fn new(pattern: Vec<(i16, i16)>) -> Self {
        Self {
            pattern,
            position: 0,
        }
    }
}

impl SampleSource for PatternSource {
    fn produce_samples(&mut self, count: usize, out: &mut [i16]) {
        if self.pattern.is_empty() {
            out[..count * 2].fill(0);
            return;
        }
        for frame in out[..count * 2].chunks_exact_mut(2) {
            let (left, right) = self.pattern[self.position];
            frame[0] = left;
            frame[1] = right;
            self.position = (self.position + 1) % self.pattern.len();
        }
    }
}
