//! URL slugs for blog posts.

use rand::Rng;

use crate::constants::blog::{MAX_SLUG_LEN, SLUG_SUFFIX_RANGE};

fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Derives a slug from a title.
///
/// Lowercases, drops everything except ASCII word characters, Cyrillic letters and
/// whitespace, collapses whitespace runs into `-`, transliterates Cyrillic and truncates
/// to [`MAX_SLUG_LEN`] characters.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_space = false;

    for c in title.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
                in_space = true;
            }
            continue;
        }

        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
        } else if let Some(latin) = transliterate(c) {
            slug.push_str(latin);
        } else {
            continue;
        }
        in_space = false;
    }

    slug.chars().take(MAX_SLUG_LEN).collect()
}

/// `slug-NNN` with a random numeric suffix, used when `slug` is already taken.
#[must_use]
pub fn with_random_suffix(slug: &str) -> String {
    let suffix = rand::rng().random_range(0..SLUG_SUFFIX_RANGE);
    format!("{slug}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_title() {
        assert_eq!(slugify("Hello,  World! 2025"), "hello-world-2025");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn test_cyrillic_is_transliterated() {
        assert_eq!(slugify("Привет мир"), "privet-mir");
        assert_eq!(slugify("Щука и ёж"), "schuka-i-yozh");
        assert_eq!(slugify("Объявление"), "obyavlenie");
    }

    #[test]
    fn test_punctuation_does_not_split_words() {
        assert_eq!(slugify("Don't stop"), "dont-stop");
        assert_eq!(slugify("a — b"), "a-b");
    }

    #[test]
    fn test_truncated_to_max_len() {
        let title = "word ".repeat(40);
        let slug = slugify(&title);
        assert_eq!(slug.chars().count(), MAX_SLUG_LEN);
        assert!(slug.starts_with("word-word-"));
    }

    #[test]
    fn test_random_suffix() {
        let slug = with_random_suffix("post");
        let (base, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(base, "post");
        assert!(suffix.parse::<u32>().unwrap() < SLUG_SUFFIX_RANGE);
    }
}
