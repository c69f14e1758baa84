use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;

use taberr_core::{Column, Value};
use taberr_plan::{ErrorTypeConfig, TypoConfig};

use super::{ErrorType, map_rows};
use crate::errors::Result;

/// ANSI QWERTY rows. Each row is offset half a key to the right of the one
/// above it.
const ANSI_QWERTY: [&str; 4] = ["1234567890-=", "qwertyuiop[]\\", "asdfghjkl;'", "zxcvbnm,./"];

/// Keyboard-neighbour typos ("butterfinger"): roughly one typo per
/// `error_period` characters, at least one per flagged cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Typo {
    pub config: TypoConfig,
    pub seed: Option<u64>,
}

impl Typo {
    pub fn new(config: TypoConfig) -> Self {
        Self { config, seed: None }
    }

    fn corrupt(&self, text: &str, rng: &mut ChaCha8Rng) -> String {
        let mut chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return random_letter(rng).to_string();
        }

        let period = self.config.error_period.max(1) as usize;
        let typos = (chars.len() / period).max(1);
        for _ in 0..typos {
            let candidates: Vec<usize> = (0..chars.len())
                .filter(|index| !neighbours(chars[*index]).is_empty())
                .collect();
            match candidates.choose(rng) {
                Some(&index) => {
                    let options = neighbours(chars[index]);
                    if let Some(&replacement) = options.choose(rng) {
                        chars[index] = replacement;
                    }
                }
                None => {
                    let index = rng.random_range(0..=chars.len());
                    chars.insert(index, random_letter(rng));
                }
            }
        }
        chars.into_iter().collect()
    }
}

impl ErrorType for Typo {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::Typo(self.config.clone())
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn transform(
        &self,
        column: &Column,
        rows: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<Value>> {
        map_rows(column, rows, |value| {
            Ok(value
                .as_str()
                .map(|text| Value::Text(self.corrupt(text, rng))))
        })
    }
}

fn random_letter(rng: &mut ChaCha8Rng) -> char {
    char::from(b'a' + rng.random_range(0..26u8))
}

/// Keys adjacent to `key` on the layout, keeping the case of letters.
fn neighbours(key: char) -> Vec<char> {
    let lower = key.to_ascii_lowercase();
    let rows: Vec<Vec<char>> = ANSI_QWERTY.iter().map(|row| row.chars().collect()).collect();
    let Some((row, col)) = rows.iter().enumerate().find_map(|(row, keys)| {
        keys.iter()
            .position(|candidate| *candidate == lower)
            .map(|col| (row, col))
    }) else {
        return Vec::new();
    };

    let mut positions = vec![(row, col.wrapping_sub(1)), (row, col + 1)];
    if row > 0 {
        positions.push((row - 1, col));
        positions.push((row - 1, col + 1));
    }
    if row + 1 < rows.len() {
        positions.push((row + 1, col.wrapping_sub(1)));
        positions.push((row + 1, col));
    }

    positions
        .into_iter()
        .filter_map(|(row, col)| rows.get(row).and_then(|keys| keys.get(col)).copied())
        .map(|neighbour| {
            if key.is_ascii_uppercase() {
                neighbour.to_ascii_uppercase()
            } else {
                neighbour
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn neighbours_follow_the_layout() {
        let mut keys = neighbours('s');
        keys.sort();
        assert_eq!(keys, vec!['a', 'd', 'e', 'w', 'x', 'z']);
        assert_eq!(neighbours('Q'), vec!['W', '1', '2', 'A']);
        assert!(neighbours('é').is_empty());
    }

    #[test]
    fn empty_strings_receive_a_character() {
        let column = Column::texts("A", ["", "Alice"]);
        let values = Typo::default()
            .transform(&column, &[0, 1], &mut seeded_rng(Some(1)))
            .expect("transform");
        assert_ne!(values[0], Value::from(""));
        assert_ne!(values[1], Value::from("Alice"));
    }

    #[test]
    fn long_values_get_several_typos() {
        let text = "abcdefghijklmnopqrstuvwxyzabcd";
        let column = Column::texts("A", [text]);
        let values = Typo::default()
            .transform(&column, &[0], &mut seeded_rng(Some(4)))
            .expect("transform");
        let changed = values[0].as_str().expect("text");
        assert_eq!(changed.chars().count(), text.chars().count());
        let differences = changed
            .chars()
            .zip(text.chars())
            .filter(|(left, right)| left != right)
            .count();
        assert!(differences <= 3);
    }
}
