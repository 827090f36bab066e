//! Conversion of ROOT-style TeX labels like `p_{T}^{truth}` to plain
//! unicode text
use std::iter::Peekable;
use std::str::Chars;

const SUPERSCRIPTS: &[(char, char)] = &[
    ('0', '⁰'), ('1', '¹'), ('2', '²'), ('3', '³'), ('4', '⁴'),
    ('5', '⁵'), ('6', '⁶'), ('7', '⁷'), ('8', '⁸'), ('9', '⁹'),
    ('+', '⁺'), ('-', '⁻'), ('=', '⁼'), ('(', '⁽'), (')', '⁾'),
    ('a', 'ᵃ'), ('b', 'ᵇ'), ('c', 'ᶜ'), ('d', 'ᵈ'), ('e', 'ᵉ'),
    ('f', 'ᶠ'), ('g', 'ᵍ'), ('h', 'ʰ'), ('i', 'ⁱ'), ('j', 'ʲ'),
    ('k', 'ᵏ'), ('l', 'ˡ'), ('m', 'ᵐ'), ('n', 'ⁿ'), ('o', 'ᵒ'),
    ('p', 'ᵖ'), ('r', 'ʳ'), ('s', 'ˢ'), ('t', 'ᵗ'), ('u', 'ᵘ'),
    ('v', 'ᵛ'), ('w', 'ʷ'), ('x', 'ˣ'), ('y', 'ʸ'), ('z', 'ᶻ'),
    ('A', 'ᴬ'), ('B', 'ᴮ'), ('D', 'ᴰ'), ('E', 'ᴱ'), ('G', 'ᴳ'),
    ('H', 'ᴴ'), ('I', 'ᴵ'), ('J', 'ᴶ'), ('K', 'ᴷ'), ('L', 'ᴸ'),
    ('M', 'ᴹ'), ('N', 'ᴺ'), ('O', 'ᴼ'), ('P', 'ᴾ'), ('R', 'ᴿ'),
    ('T', 'ᵀ'), ('U', 'ᵁ'), ('V', 'ⱽ'), ('W', 'ᵂ'),
    ('β', 'ᵝ'), ('γ', 'ᵞ'), ('δ', 'ᵟ'),
];

const SUBSCRIPTS: &[(char, char)] = &[
    ('0', '₀'), ('1', '₁'), ('2', '₂'), ('3', '₃'), ('4', '₄'),
    ('5', '₅'), ('6', '₆'), ('7', '₇'), ('8', '₈'), ('9', '₉'),
    ('+', '₊'), ('-', '₋'), ('=', '₌'), ('(', '₍'), (')', '₎'),
    ('a', 'ₐ'), ('e', 'ₑ'), ('h', 'ₕ'), ('i', 'ᵢ'), ('j', 'ⱼ'),
    ('k', 'ₖ'), ('l', 'ₗ'), ('m', 'ₘ'), ('n', 'ₙ'), ('o', 'ₒ'),
    ('p', 'ₚ'), ('r', 'ᵣ'), ('s', 'ₛ'), ('t', 'ₜ'), ('u', 'ᵤ'),
    ('v', 'ᵥ'), ('x', 'ₓ'), ('β', 'ᵦ'),
];

fn greek(name: &str) -> Option<char> {
    let c = match name {
        "alpha" => 'α',
        "beta" => 'β',
        "gamma" => 'γ',
        "delta" => 'δ',
        "Delta" => 'Δ',
        "eta" => 'η',
        "mu" => 'μ',
        "phi" => 'φ',
        "sigma" => 'σ',
        "tau" => 'τ',
        _ => return None,
    };
    Some(c)
}

/// Replace Greek letter commands, sub- and superscripts by their
/// unicode equivalents
///
/// Scripts without a complete unicode equivalent are kept in TeX
/// notation, except for single characters which are appended as is.
pub fn to_unicode(tex: &str) -> String {
    let mut res = String::with_capacity(tex.len());
    let mut chars = tex.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '#' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                match greek(&name) {
                    Some(letter) => res.push(letter),
                    None => res.push_str(&name),
                }
            }
            '_' | '^' => {
                let arg = to_unicode(&script_argument(&mut chars));
                let table = if c == '_' { SUBSCRIPTS } else { SUPERSCRIPTS };
                match translate(&arg, table) {
                    Some(script) => res.push_str(&script),
                    None if arg.chars().count() == 1 => res.push_str(&arg),
                    None => {
                        res.push(c);
                        res.push_str(&arg);
                    }
                }
            }
            c => res.push(c),
        }
    }
    res
}

// either a braced group or a single character
fn script_argument(chars: &mut Peekable<Chars<'_>>) -> String {
    if chars.peek() != Some(&'{') {
        return chars.next().map(String::from).unwrap_or_default();
    }
    chars.next();
    let mut depth = 1;
    let mut arg = String::new();
    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        arg.push(c);
    }
    arg
}

fn translate(s: &str, table: &[(char, char)]) -> Option<String> {
    if s.is_empty() {
        return None;
    }
    s.chars()
        .map(|c| table.iter().find(|(from, _)| *from == c).map(|(_, to)| *to))
        .collect()
}
