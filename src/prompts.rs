use crate::log::Log;
use rand::Rng;
use rand::seq::SliceRandom;

const PREVIEW_CHARS: usize = 60;

pub const PROMPTS: &[&str] = &[
    "Sports car on a night highway, blue neon, heavy rain, cyberpunk atmosphere",
    "Joker laughing in urban chaos, gold and purple tones, psychological atmosphere",
    "GTA-style heist scene, money flying, night-time city chase",
    "Epic anime fight, glowing effects, explosion of vibrant colors",
    "Futuristic neon city, falling digital code, Matrix atmosphere",
    "Lamborghini accelerating through a lit tunnel, motion blur",
    "Samurai fighting in the rain, slow motion, cinematic look",
    "Urban explosion with particles, slow motion, saturated colors",
];

pub(crate) fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

pub fn pick_prompt<R: Rng + ?Sized>(rng: &mut R, log: &Log) -> &'static str {
    // PROMPTS is a non-empty constant.
    let selected = PROMPTS.choose(rng).copied().unwrap_or(PROMPTS[0]);
    log.info(format!("Prompt selected: {}...", preview(selected, PREVIEW_CHARS)));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn seeded_picks_cover_the_list() {
        let mut rng = StdRng::seed_from_u64(42);
        let log = Log::new();
        let seen: HashSet<&str> = (0..1000).map(|_| pick_prompt(&mut rng, &log)).collect();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|p| PROMPTS.contains(p)));
        assert_eq!(seen.len(), PROMPTS.len());
    }

    #[test]
    fn same_seed_same_sequence() {
        let log = Log::new();
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            assert_eq!(pick_prompt(&mut a, &log), pick_prompt(&mut b, &log));
        }
    }

    #[test]
    fn preview_cuts_on_char_boundary() {
        assert_eq!(preview("short", 60), "short");
        assert_eq!(preview("ñandú", 3), "ñan");
        assert_eq!(preview(PROMPTS[0], 60).chars().count(), 60);
    }

    #[test]
    fn logs_a_preview() {
        let (hook, lines) = crate::log::memory_hook();
        let log = Log::new().with_hook(hook);
        let mut rng = StdRng::seed_from_u64(1);
        pick_prompt(&mut rng, &log);
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[INFO] Prompt selected: "));
        assert!(lines[0].ends_with("..."));
    }
}
