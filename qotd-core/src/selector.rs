//! Политики выбора следующей цитаты.
//!
//! Селектор - это замкнутое перечисление из четырёх вариантов с
//! состоянием на вариант. Размер корпуса хранится внутри и меняется
//! только через [`Selector::reset`] при горячей замене корпуса.
//!
//! Семантика сброса по режимам:
//! - `random`: просто принимает новый размер;
//! - `sequential`: позиция безусловно в 0 (позиция никогда не
//!   переживает пересборку);
//! - `random-no-repeat`: множество выданных индексов очищается;
//! - `shuffle-cycle`: свежая перестановка Fisher-Yates, позиция в 0.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

/// Политика выбора следующей цитаты.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Равномерно случайный индекс, повторы подряд допустимы
    Random,
    /// По кругу в порядке корпуса, начиная с 0
    Sequential,
    /// Случайно без повторов до исчерпания цикла
    RandomNoRepeat,
    /// Случайная перестановка, проходимая целиком, затем новая
    ShuffleCycle,
}

impl Mode {
    /// Имя режима, как оно пишется в конфигурации.
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Random => "random",
            Mode::Sequential => "sequential",
            Mode::RandomNoRepeat => "random-no-repeat",
            Mode::ShuffleCycle => "shuffle-cycle",
        }
    }
}

/// Генератор индексов поверх корпуса фиксированного размера.
#[derive(Debug)]
pub struct Selector {
    size: usize,
    state: State,
}

#[derive(Debug)]
enum State {
    Random,
    Sequential { pos: usize },
    RandomNoRepeat { exhausted: HashSet<usize> },
    ShuffleCycle { order: Vec<usize>, pos: usize },
}

impl Selector {
    /// Новый селектор для корпуса из `size` цитат.
    pub fn new(mode: Mode, size: usize) -> Self {
        let state = match mode {
            Mode::Random => State::Random,
            Mode::Sequential => State::Sequential { pos: 0 },
            Mode::RandomNoRepeat => State::RandomNoRepeat {
                exhausted: HashSet::new(),
            },
            Mode::ShuffleCycle => State::ShuffleCycle {
                order: shuffled(size),
                pos: 0,
            },
        };
        Self { size, state }
    }

    /// Следующий индекс в `[0, size)`. `None` только при пустом корпусе.
    pub fn next(&mut self) -> Option<usize> {
        let size = self.size;
        if size == 0 {
            return None;
        }
        let index = match &mut self.state {
            State::Random => rand::rng().random_range(0..size),
            State::Sequential { pos } => {
                let i = *pos;
                *pos = (i + 1) % size;
                i
            }
            State::RandomNoRepeat { exhausted } => {
                if exhausted.len() == size {
                    // цикл исчерпан: начинаем новый
                    exhausted.clear();
                }
                let remaining: Vec<usize> =
                    (0..size).filter(|i| !exhausted.contains(i)).collect();
                let i = remaining[rand::rng().random_range(0..remaining.len())];
                exhausted.insert(i);
                i
            }
            State::ShuffleCycle { order, pos } => {
                let i = order[*pos];
                *pos += 1;
                if *pos == size {
                    order.shuffle(&mut rand::rng());
                    *pos = 0;
                }
                i
            }
        };
        Some(index)
    }

    /// Сброс под новый (возможно, другой) размер корпуса.
    pub fn reset(&mut self, size: usize) {
        self.size = size;
        match &mut self.state {
            State::Random => {}
            State::Sequential { pos } => *pos = 0,
            State::RandomNoRepeat { exhausted } => exhausted.clear(),
            State::ShuffleCycle { order, pos } => {
                *order = shuffled(size);
                *pos = 0;
            }
        }
    }
}

fn shuffled(size: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..size).collect();
    order.shuffle(&mut rand::rng());
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(s: &mut Selector, n: usize) -> Vec<usize> {
        (0..n).map(|_| s.next().expect("non-empty corpus")).collect()
    }

    fn is_permutation(window: &[usize], n: usize) -> bool {
        let set: HashSet<usize> = window.iter().copied().collect();
        window.len() == n && set.len() == n && set.iter().all(|&i| i < n)
    }

    #[test]
    fn empty_corpus_yields_none_for_every_mode() {
        for mode in [
            Mode::Random,
            Mode::Sequential,
            Mode::RandomNoRepeat,
            Mode::ShuffleCycle,
        ] {
            let mut s = Selector::new(mode, 0);
            assert_eq!(s.next(), None, "mode {}", mode.name());
        }
    }

    #[test]
    fn all_modes_stay_in_range() {
        for mode in [
            Mode::Random,
            Mode::Sequential,
            Mode::RandomNoRepeat,
            Mode::ShuffleCycle,
        ] {
            let mut s = Selector::new(mode, 7);
            for _ in 0..100 {
                let i = s.next().unwrap();
                assert!(i < 7, "mode {} gave {i}", mode.name());
            }
        }
    }

    #[test]
    fn sequential_walks_in_order_and_wraps() {
        let mut s = Selector::new(Mode::Sequential, 3);
        assert_eq!(take(&mut s, 7), vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn sequential_reset_restarts_at_zero() {
        let mut s = Selector::new(Mode::Sequential, 3);
        assert_eq!(s.next(), Some(0));
        assert_eq!(s.next(), Some(1));

        s.reset(4);
        assert_eq!(take(&mut s, 5), vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn no_repeat_cycle_is_a_permutation() {
        let n = 10;
        let mut s = Selector::new(Mode::RandomNoRepeat, n);
        // несколько подряд идущих окон по n: каждое без повторов
        for _ in 0..3 {
            let window = take(&mut s, n);
            assert!(is_permutation(&window, n), "window {window:?}");
        }
    }

    #[test]
    fn no_repeat_reset_clears_exhausted() {
        let n = 5;
        let mut s = Selector::new(Mode::RandomNoRepeat, n);
        let _ = take(&mut s, 3);

        s.reset(n);
        // после сброса полный цикл снова возможен
        let window = take(&mut s, n);
        assert!(is_permutation(&window, n), "window {window:?}");
    }

    #[test]
    fn shuffle_cycle_windows_are_permutations() {
        let n = 8;
        let mut s = Selector::new(Mode::ShuffleCycle, n);
        for _ in 0..4 {
            let window = take(&mut s, n);
            assert!(is_permutation(&window, n), "window {window:?}");
        }
    }

    #[test]
    fn shuffle_cycle_reset_gives_fresh_full_permutation() {
        let n = 6;
        let mut s = Selector::new(Mode::ShuffleCycle, n);
        let _ = take(&mut s, 4); // середина цикла

        s.reset(n);
        let window = take(&mut s, n);
        assert!(is_permutation(&window, n), "window {window:?}");
    }

    #[test]
    fn reset_to_smaller_size_keeps_indices_in_range() {
        for mode in [
            Mode::Random,
            Mode::Sequential,
            Mode::RandomNoRepeat,
            Mode::ShuffleCycle,
        ] {
            let mut s = Selector::new(mode, 10);
            let _ = take(&mut s, 7);

            s.reset(2);
            for _ in 0..10 {
                let i = s.next().unwrap();
                assert!(i < 2, "mode {} gave {i} after shrink", mode.name());
            }
        }
    }

    #[test]
    fn reset_to_zero_yields_none() {
        let mut s = Selector::new(Mode::Random, 3);
        assert!(s.next().is_some());
        s.reset(0);
        assert_eq!(s.next(), None);
    }

    #[test]
    fn random_covers_all_indices_eventually() {
        let n = 10;
        let mut s = Selector::new(Mode::Random, n);
        let mut counts = vec![0usize; n];
        let draws = 10_000;
        for _ in 0..draws {
            counts[s.next().unwrap()] += 1;
        }
        // грубая проверка равномерности: каждый индекс в пределах
        // половины-полутора от ожидаемого
        let expected = draws / n;
        for (i, &c) in counts.iter().enumerate() {
            assert!(
                c > expected / 2 && c < expected * 2,
                "index {i} drawn {c} times out of {draws}"
            );
        }
    }

    #[test]
    fn mode_names_match_config_spelling() {
        assert_eq!(Mode::Random.name(), "random");
        assert_eq!(Mode::Sequential.name(), "sequential");
        assert_eq!(Mode::RandomNoRepeat.name(), "random-no-repeat");
        assert_eq!(Mode::ShuffleCycle.name(), "shuffle-cycle");
    }

    #[test]
    fn mode_deserializes_from_kebab_case() {
        #[derive(Deserialize)]
        struct Wrap {
            mode: Mode,
        }
        let w: Wrap = toml::from_str("mode = \"random-no-repeat\"").unwrap();
        assert_eq!(w.mode, Mode::RandomNoRepeat);
        let w: Wrap = toml::from_str("mode = \"shuffle-cycle\"").unwrap();
        assert_eq!(w.mode, Mode::ShuffleCycle);
        assert!(toml::from_str::<Wrap>("mode = \"bogus\"").is_err());
    }
}
