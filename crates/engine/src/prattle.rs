// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flavor text: what a printer says, and how long it waits before saying
//! it again.
//!
//! Every choice comes from a [`ShuffleBag`], so a phrase is not repeated
//! until the whole list has been used.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Draws items in random order, reshuffling once all have been drawn
#[derive(Debug, Clone)]
pub struct ShuffleBag<T> {
    items: Vec<T>,
    order: Vec<usize>,
}

impl<T> ShuffleBag<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            order: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `None` only for an empty bag
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&T> {
        if self.order.is_empty() {
            self.order = (0..self.items.len()).collect();
            self.order.shuffle(rng);
        }
        let index = self.order.pop()?;
        self.items.get(index)
    }
}

/// Produces the lines of one message
pub trait Prattler: Send {
    fn next_prattle(&mut self) -> Vec<String>;
}

/// A prattler that also picks the wait before its next message
pub trait RepeatingPrattler: Prattler {
    fn next_delay(&mut self) -> Duration;
}

const DELAY_MINUTES: [u64; 11] = [23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67];
const DELAY_SECONDS: [u64; 17] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59];

/// Prime-numbered waits, so several printers rarely speak at once
#[derive(Debug, Clone)]
pub struct PrimeDelay {
    minutes: Option<ShuffleBag<u64>>,
    seconds: ShuffleBag<u64>,
}

impl PrimeDelay {
    /// 23 to 67 minutes plus a prime number of seconds
    pub fn long() -> Self {
        Self {
            minutes: Some(ShuffleBag::new(DELAY_MINUTES.to_vec())),
            seconds: ShuffleBag::new(DELAY_SECONDS.to_vec()),
        }
    }

    /// 23 to 67 seconds
    pub fn short() -> Self {
        Self {
            minutes: None,
            seconds: ShuffleBag::new(DELAY_MINUTES.to_vec()),
        }
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
        let minutes = self
            .minutes
            .as_mut()
            .and_then(|bag| bag.draw(rng).copied())
            .unwrap_or(0);
        let seconds = self.seconds.draw(rng).copied().unwrap_or(0);
        Duration::from_secs(minutes * 60 + seconds)
    }
}

/// Fixed phrases, each possibly spanning several lines
#[derive(Debug, Clone)]
struct Phrases {
    bag: ShuffleBag<&'static str>,
    rng: StdRng,
}

impl Phrases {
    fn new(phrases: &[&'static str], seed: u64) -> Self {
        Self {
            bag: ShuffleBag::new(phrases.to_vec()),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn next(&mut self) -> Vec<String> {
        self.bag
            .draw(&mut self.rng)
            .map(|phrase| split_lines(phrase))
            .unwrap_or_default()
    }
}

/// Split a message into the lines posted one by one
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

const BUSY: &[&str] = &[
    "Oh happy day! Squeezing hot plastic through my extruder is such a good feeling!",
];

const SUCCESS: &[&str] = &[
    "Done! Another fine thing brought to you by your favourite Prattle Printer!",
    "Yippie yi yo kayah. I'm an old FDM and I come from Midlothian. I learned to heat, heat, heat 'fore I learned to print.\nOh. Sorry. I got bored.\nDone! What do you want to print next?",
];

const PAUSED: &[&str] = &[
    "Why oh why did you stop me! Printing is so much fun!",
    "Paused!!! Why? Why would you stop me?",
    "What pray tell would bring you to pause me?",
    "I was so close. Why would you pause me now?",
];

const INOPERABLE: &[&str] = &[
    "Oh no! My hardware! I can't talk to my hardware! Something is terribly terribly wrong!",
    "Oh, lovely hardware. Why won't you talk to me? What have I done to deserve this scorn?",
    "Hardware not talking. Hardware not talking. Please help. Please help.",
    "Terrible day. Truly terrible day. I can't print. My hardware is ignoring me.",
    "My treacherous hardware has gone walkabout! If you find it, give it a righteous wholloping and send it home.",
];

/// Said once when a print starts
#[derive(Debug, Clone)]
pub struct BusyPrattler(Phrases);

impl BusyPrattler {
    pub fn new(seed: u64) -> Self {
        Self(Phrases::new(BUSY, seed))
    }
}

impl Prattler for BusyPrattler {
    fn next_prattle(&mut self) -> Vec<String> {
        self.0.next()
    }
}

/// Said once when a print finishes
#[derive(Debug, Clone)]
pub struct SuccessPrattler(Phrases);

impl SuccessPrattler {
    pub fn new(seed: u64) -> Self {
        Self(Phrases::new(SUCCESS, seed))
    }
}

impl Prattler for SuccessPrattler {
    fn next_prattle(&mut self) -> Vec<String> {
        self.0.next()
    }
}

/// Nags about every minute while a print is paused
#[derive(Debug, Clone)]
pub struct PausedPrattler {
    phrases: Phrases,
    delay: PrimeDelay,
}

impl PausedPrattler {
    pub fn new(seed: u64) -> Self {
        Self {
            phrases: Phrases::new(PAUSED, seed),
            delay: PrimeDelay::short(),
        }
    }
}

impl Prattler for PausedPrattler {
    fn next_prattle(&mut self) -> Vec<String> {
        self.phrases.next()
    }
}

impl RepeatingPrattler for PausedPrattler {
    fn next_delay(&mut self) -> Duration {
        self.delay.next(&mut self.phrases.rng)
    }
}

/// Complains every half hour or so while the hardware is not responding
#[derive(Debug, Clone)]
pub struct InoperablePrattler {
    phrases: Phrases,
    delay: PrimeDelay,
}

impl InoperablePrattler {
    pub fn new(seed: u64) -> Self {
        Self {
            phrases: Phrases::new(INOPERABLE, seed),
            delay: PrimeDelay::long(),
        }
    }
}

impl Prattler for InoperablePrattler {
    fn next_prattle(&mut self) -> Vec<String> {
        self.phrases.next()
    }
}

impl RepeatingPrattler for InoperablePrattler {
    fn next_delay(&mut self) -> Duration {
        self.delay.next(&mut self.phrases.rng)
    }
}

const SIZES: &[Option<&str>] = &[
    Some("Big"),
    Some("Colossal"),
    Some("Compact"),
    Some("Cosmic"),
    Some("Elfin"),
    Some("Enormous"),
    Some("Epic"),
    Some("Gargantuan"),
    Some("Giant"),
    Some("Ginormous"),
    Some("Huge"),
    Some("Humongous"),
    Some("Infinitesimal"),
    Some("Life-Size"),
    Some("Little"),
    Some("Mammoth"),
    Some("Microscopic"),
    Some("Miniature"),
    Some("Petite"),
    Some("Pocket-Size"),
    Some("Teeny-Tiny"),
    Some("Tiny"),
    Some("Titanic"),
    Some("Wee"),
    Some("Whopping"),
    None,
    None,
    None,
    None,
];

const OPACITY: &[Option<&str>] = &[
    Some("Translucent"),
    Some("Opaque"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

const SHADE: &[Option<&str>] = &[
    Some("Dark"),
    Some("Light"),
    Some("Deep"),
    Some("Sparkly"),
    Some("Vibrant"),
    Some("Pale"),
    None,
    None,
    None,
    None,
];

/// Color name, and whether opacity and shade modifiers may precede it
#[derive(Debug, Clone, Copy)]
struct Color {
    name: &'static str,
    modifiable: bool,
}

const fn plain(name: &'static str) -> Color {
    Color {
        name,
        modifiable: false,
    }
}

const fn shaded(name: &'static str) -> Color {
    Color {
        name,
        modifiable: true,
    }
}

const COLORS: &[Color] = &[
    plain("Glow-in-the-dark"),
    plain("Clear"),
    shaded("Aqua"),
    shaded("Aquamarine"),
    shaded("Azure"),
    shaded("Black"),
    shaded("Blue"),
    shaded("Brown"),
    shaded("Chartreuse"),
    shaded("Coral"),
    shaded("Cyan"),
    shaded("Forest-Green"),
    shaded("Fuchsia"),
    shaded("Gold"),
    shaded("Gray"),
    shaded("Green"),
    shaded("Hot-Pink"),
    shaded("Ivory"),
    shaded("Khaki"),
    shaded("Lavender"),
    shaded("Lime"),
    shaded("Magenta"),
    shaded("Maroon"),
    shaded("Navy"),
    shaded("Olive"),
    shaded("Orange"),
    shaded("Pink"),
    shaded("Plum"),
    shaded("Purple"),
    shaded("Red"),
    shaded("Salmon"),
    shaded("Silver"),
    shaded("Teal"),
    shaded("Turquoise"),
    shaded("Violet"),
    shaded("White"),
    shaded("Yellow"),
];

const SUGGESTIONS: &[&str] = &[
    "Action Figure",
    "Benchy",
    "Boat",
    "Bottle Opener",
    "Bracket",
    "Cable Clip",
    "Calibration Cube",
    "Cookie Cutter",
    "Dinosaur",
    "Dragon",
    "Dwarf",
    "Elf",
    "Gear",
    "Gnome",
    "Hook",
    "Infinity Stone",
    "Knob",
    "Lid",
    "Light House",
    "Minion",
    "Octopus",
    "Pen Holder",
    "Phone Stand",
    "Planter",
    "Rocket",
    "Skull",
    "Spider",
    "Spinner",
    "Sword",
    "Vase",
    "Viking",
    "Whistle",
];

const QUESTIONS: &[&str] = &[
    "Anyone like {item}?",
    "How 'bout {item}?",
    "Aah, so you'd like {item}.",
    "OK, here's my question: Would you like {item}?",
    "Oh, very well. Here's my next question: Would you like {item}?",
    "The next question is this: Given that God is infinite, and that the universe is also infinite... Would you like {item}?",
    "I promise. This is my last question: If the entire universe is a finite state machine that stops running when maximum entropy is reached... Can I make {item} for you?",
];

/// Suggests something to print while the printer sits idle
#[derive(Debug, Clone)]
pub struct IdlePrattler {
    rng: StdRng,
    sizes: ShuffleBag<Option<&'static str>>,
    opacity: ShuffleBag<Option<&'static str>>,
    shade: ShuffleBag<Option<&'static str>>,
    colors: ShuffleBag<Color>,
    suggestions: ShuffleBag<&'static str>,
    questions: ShuffleBag<&'static str>,
    delay: PrimeDelay,
}

impl IdlePrattler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sizes: ShuffleBag::new(SIZES.to_vec()),
            opacity: ShuffleBag::new(OPACITY.to_vec()),
            shade: ShuffleBag::new(SHADE.to_vec()),
            colors: ShuffleBag::new(COLORS.to_vec()),
            suggestions: ShuffleBag::new(SUGGESTIONS.to_vec()),
            questions: ShuffleBag::new(QUESTIONS.to_vec()),
            delay: PrimeDelay::long(),
        }
    }

    /// e.g. "a Tiny Translucent Red Boat"
    fn item(&mut self) -> String {
        let rng = &mut self.rng;
        let size = self.sizes.draw(rng).copied().flatten();
        let color = self.colors.draw(rng).copied().unwrap_or(plain("Clear"));
        let (opacity, shade) = if color.modifiable {
            (
                self.opacity.draw(rng).copied().flatten(),
                self.shade.draw(rng).copied().flatten(),
            )
        } else {
            (None, None)
        };
        let suggestion = self.suggestions.draw(rng).copied().unwrap_or("Boat");
        let words: Vec<&str> = [size, opacity, shade, Some(color.name), Some(suggestion)]
            .into_iter()
            .flatten()
            .collect();
        let name = words.join(" ");
        format!("{} {}", article(&name), name)
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some(c) if "aeiouAEIOU".contains(c) => "an",
        _ => "a",
    }
}

impl Prattler for IdlePrattler {
    /// Long questions are posted in parts, each ending in "..."
    fn next_prattle(&mut self) -> Vec<String> {
        let item = self.item();
        let question = self
            .questions
            .draw(&mut self.rng)
            .copied()
            .unwrap_or("Anyone like {item}?");
        let text = question.replace("{item}", &item);
        let mut parts: Vec<String> = text.split("...").map(|p| p.trim().to_string()).collect();
        let last = parts.len().saturating_sub(1);
        for part in parts.iter_mut().take(last) {
            part.push_str("...");
        }
        parts
    }
}

impl RepeatingPrattler for IdlePrattler {
    fn next_delay(&mut self) -> Duration {
        self.delay.next(&mut self.rng)
    }
}

#[cfg(test)]
#[path = "prattle_tests.rs"]
mod tests;
