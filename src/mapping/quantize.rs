//! Quantize mapper for snapping MIDI notes to musical scales

use super::Mapper;

const NOTE_NAMES: [&str; 12] = ["c", "c#", "d", "d#", "e", "f", "f#", "g", "g#", "a", "a#", "b"];

/// Musical scale definition (intervals in semitones from root)
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    name: String,
    intervals: Vec<u8>,
}

impl Scale {
    /// Create a new scale
    pub fn new(name: &str, intervals: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            intervals,
        }
    }

    /// Every semitone, i.e. no quantization
    pub fn chromatic() -> Self {
        Self::new("chromatic", (0..12).collect())
    }

    /// Minor pentatonic scale (root, m3, P4, P5, m7)
    pub fn minor_pentatonic() -> Self {
        Self::new("minor_pentatonic", vec![0, 3, 5, 7, 10])
    }

    /// Major pentatonic scale (root, M2, M3, P5, M6)
    pub fn major_pentatonic() -> Self {
        Self::new("major_pentatonic", vec![0, 2, 4, 7, 9])
    }

    /// Natural minor scale
    pub fn minor() -> Self {
        Self::new("minor", vec![0, 2, 3, 5, 7, 8, 10])
    }

    /// Major scale
    pub fn major() -> Self {
        Self::new("major", vec![0, 2, 4, 5, 7, 9, 11])
    }

    /// Dorian mode
    pub fn dorian() -> Self {
        Self::new("dorian", vec![0, 2, 3, 5, 7, 9, 10])
    }

    /// Whole tone scale
    pub fn whole_tone() -> Self {
        Self::new("whole_tone", vec![0, 2, 4, 6, 8, 10])
    }

    /// Blues scale (minor pentatonic plus the flat fifth)
    pub fn blues() -> Self {
        Self::new("blues", vec![0, 3, 5, 6, 7, 10])
    }

    /// Get scale by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "chromatic" | "none" => Some(Self::chromatic()),
            "pentatonic" | "minor_pentatonic" | "minorpentatonic" => Some(Self::minor_pentatonic()),
            "major_pentatonic" | "majorpentatonic" => Some(Self::major_pentatonic()),
            "minor" | "natural_minor" => Some(Self::minor()),
            "major" => Some(Self::major()),
            "dorian" => Some(Self::dorian()),
            "whole_tone" | "wholetone" => Some(Self::whole_tone()),
            "blues" => Some(Self::blues()),
            _ => None,
        }
    }

    /// Get the name of this scale
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the intervals
    pub fn intervals(&self) -> &[u8] {
        &self.intervals
    }

    /// True when every semitone is a member
    pub fn is_chromatic(&self) -> bool {
        (0..12).all(|pc| self.intervals.contains(&pc))
    }
}

/// Pitch class of a key name such as `"C"`, `"f#"` or `"Bb"`
pub fn pitch_class(key: &str) -> Option<u8> {
    let key = key.trim().to_lowercase();
    if let Some(pc) = NOTE_NAMES.iter().position(|n| *n == key) {
        return Some(pc as u8);
    }

    // Flats are spelled as the sharp a semitone below
    let natural = key.strip_suffix('b')?;
    let pc = NOTE_NAMES.iter().position(|n| *n == natural)?;
    Some(((pc + 11) % 12) as u8)
}

/// A mapper that snaps MIDI note numbers to a scale
pub struct QuantizeMapper {
    name: String,
    root: u8,
    scale: Scale,
}

impl QuantizeMapper {
    /// Create a new quantize mapper
    ///
    /// # Arguments
    /// * `name` - Name for this mapper
    /// * `root` - Pitch class of the key, `0` = C
    /// * `scale` - The scale to quantize to
    pub fn new(name: &str, root: u8, scale: Scale) -> Self {
        Self {
            name: name.to_string(),
            root: root % 12,
            scale,
        }
    }

    /// Snap a note to the nearest scale degree, ties resolve downward
    pub fn quantize_note(&self, note: u8) -> u8 {
        if self.scale.intervals().is_empty() || self.scale.is_chromatic() {
            return note;
        }

        let offset = (note as i32 - self.root as i32).rem_euclid(12);
        let octave_base = note as i32 - offset;

        let mut candidates: Vec<i32> = self
            .scale
            .intervals()
            .iter()
            .flat_map(|&i| [i as i32 - 12, i as i32, i as i32 + 12])
            .collect();
        candidates.sort_unstable();

        let mut nearest = offset;
        let mut min_dist = i32::MAX;
        for degree in candidates {
            let dist = (offset - degree).abs();
            if dist < min_dist {
                min_dist = dist;
                nearest = degree;
            }
        }

        (octave_base + nearest).clamp(0, 127) as u8
    }
}

impl Mapper for QuantizeMapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn map(&self, input: f64) -> f64 {
        let note = input.round().clamp(0.0, 127.0) as u8;
        self.quantize_note(note) as f64
    }
}
