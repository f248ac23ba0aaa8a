// Cardinal numbers spelled out in words, per language.

use super::Language;

pub fn to_words(n: i64, language: Language) -> String {
    let magnitude = n.unsigned_abs();
    let words = match language {
        Language::En => english(magnitude),
        Language::Es => spanish(magnitude),
        Language::Fr => french(magnitude),
        Language::De => german(magnitude),
        Language::It => italian(magnitude),
        Language::Pt => portuguese(magnitude),
        Language::Ru => russian(magnitude),
        Language::Ar => arabic(magnitude),
    };

    if n < 0 {
        let minus = match language {
            Language::En | Language::De => "minus",
            Language::Ru => "минус",
            Language::Ar => "سالب",
            Language::Es | Language::Pt => "menos",
            Language::Fr => "moins",
            Language::It => "meno",
        };
        format!("{} {}", minus, words)
    } else {
        words
    }
}

/// Groups of three digits, least significant first
fn thousands_groups(mut n: u64) -> Vec<u64> {
    let mut groups = Vec::new();
    while n > 0 {
        groups.push(n % 1000);
        n /= 1000;
    }
    groups
}

// English (short scale)

const EN_ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven", "twelve",
    "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen", "nineteen",
];
const EN_TENS: [&str; 10] = ["", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety"];
const EN_SCALES: [&str; 7] = ["", "thousand", "million", "billion", "trillion", "quadrillion", "quintillion"];

fn en_below_100(n: u64) -> String {
    if n < 20 {
        return EN_ONES[n as usize].to_string();
    }
    match n % 10 {
        0 => EN_TENS[(n / 10) as usize].to_string(),
        unit => format!("{}-{}", EN_TENS[(n / 10) as usize], EN_ONES[unit as usize]),
    }
}

fn en_below_1000(n: u64) -> String {
    match (n / 100, n % 100) {
        (0, rest) => en_below_100(rest),
        (hundreds, 0) => format!("{} hundred", EN_ONES[hundreds as usize]),
        (hundreds, rest) => format!("{} hundred and {}", EN_ONES[hundreds as usize], en_below_100(rest)),
    }
}

fn english(n: u64) -> String {
    if n == 0 {
        return EN_ONES[0].to_string();
    }

    let groups = thousands_groups(n);
    let mut parts: Vec<String> = Vec::new();
    for (scale, &group) in groups.iter().enumerate().rev() {
        if group == 0 {
            continue;
        }
        let words = en_below_1000(group);
        parts.push(if scale == 0 { words } else { format!("{} {}", words, EN_SCALES[scale]) });
    }

    // "one thousand and one", but "one thousand, two hundred"
    if parts.len() > 1 && groups[0] > 0 && groups[0] < 100 {
        let last = parts.pop().unwrap_or_default();
        format!("{} and {}", parts.join(", "), last)
    } else {
        parts.join(", ")
    }
}

// Spanish (long scale: millón, mil millones, billón)

const ES_UNITS: [&str; 30] = [
    "cero", "uno", "dos", "tres", "cuatro", "cinco", "seis", "siete", "ocho", "nueve", "diez", "once", "doce",
    "trece", "catorce", "quince", "dieciséis", "diecisiete", "dieciocho", "diecinueve", "veinte", "veintiuno",
    "veintidós", "veintitrés", "veinticuatro", "veinticinco", "veintiséis", "veintisiete", "veintiocho",
    "veintinueve",
];
const ES_TENS: [&str; 10] = [
    "", "", "", "treinta", "cuarenta", "cincuenta", "sesenta", "setenta", "ochenta", "noventa",
];
const ES_HUNDREDS: [&str; 10] = [
    "", "ciento", "doscientos", "trescientos", "cuatrocientos", "quinientos", "seiscientos", "setecientos",
    "ochocientos", "novecientos",
];
const ES_SCALES: [(u64, &str, &str); 3] = [
    (1_000_000_000_000_000_000, "trillón", "trillones"),
    (1_000_000_000_000, "billón", "billones"),
    (1_000_000, "millón", "millones"),
];

fn es_below_100(n: u64) -> String {
    if n < 30 {
        return ES_UNITS[n as usize].to_string();
    }
    match n % 10 {
        0 => ES_TENS[(n / 10) as usize].to_string(),
        unit => format!("{} y {}", ES_TENS[(n / 10) as usize], ES_UNITS[unit as usize]),
    }
}

fn es_below_1000(n: u64) -> String {
    match (n / 100, n % 100) {
        (0, rest) => es_below_100(rest),
        (1, 0) => "cien".to_string(),
        (hundreds, 0) => ES_HUNDREDS[hundreds as usize].to_string(),
        (hundreds, rest) => format!("{} {}", ES_HUNDREDS[hundreds as usize], es_below_100(rest)),
    }
}

/// "uno" shortens to "un" in front of a noun: "veintiún mil", "un millón"
fn es_apocope(words: String) -> String {
    if let Some(stem) = words.strip_suffix("veintiuno") {
        format!("{}veintiún", stem)
    } else if let Some(stem) = words.strip_suffix("uno") {
        format!("{}un", stem)
    } else {
        words
    }
}

fn es_below_million(n: u64) -> String {
    let (thousands, rest) = (n / 1000, n % 1000);
    let mut parts = Vec::new();
    match thousands {
        0 => {}
        1 => parts.push("mil".to_string()),
        t => parts.push(format!("{} mil", es_apocope(es_below_1000(t)))),
    }
    if rest > 0 || parts.is_empty() {
        parts.push(es_below_1000(rest));
    }
    parts.join(" ")
}

fn spanish(n: u64) -> String {
    let mut parts = Vec::new();
    let mut rest = n;
    for (value, singular, plural) in ES_SCALES {
        let count = rest / value;
        rest %= value;
        match count {
            0 => {}
            1 => parts.push(format!("un {}", singular)),
            c => parts.push(format!("{} {}", es_apocope(es_below_million(c)), plural)),
        }
    }
    if rest > 0 || parts.is_empty() {
        parts.push(es_below_million(rest));
    }
    parts.join(" ")
}

// French

const FR_UNITS: [&str; 17] = [
    "zéro", "un", "deux", "trois", "quatre", "cinq", "six", "sept", "huit", "neuf", "dix", "onze", "douze",
    "treize", "quatorze", "quinze", "seize",
];
const FR_TENS: [&str; 7] = ["", "", "vingt", "trente", "quarante", "cinquante", "soixante"];
const FR_SCALES: [(&str, &str); 7] = [
    ("", ""),
    ("mille", "mille"),
    ("million", "millions"),
    ("milliard", "milliards"),
    ("billion", "billions"),
    ("billiard", "billiards"),
    ("trillion", "trillions"),
];

fn fr_below_100(n: u64) -> String {
    match n {
        0..=16 => FR_UNITS[n as usize].to_string(),
        17..=19 => format!("dix-{}", FR_UNITS[(n - 10) as usize]),
        20..=69 => {
            let tens = FR_TENS[(n / 10) as usize];
            match n % 10 {
                0 => tens.to_string(),
                1 => format!("{} et un", tens),
                unit => format!("{}-{}", tens, FR_UNITS[unit as usize]),
            }
        }
        71 => "soixante et onze".to_string(),
        70..=79 => format!("soixante-{}", fr_below_100(n - 60)),
        80 => "quatre-vingts".to_string(),
        _ => format!("quatre-vingt-{}", fr_below_100(n - 80)),
    }
}

fn fr_below_1000(n: u64) -> String {
    match (n / 100, n % 100) {
        (0, rest) => fr_below_100(rest),
        (1, 0) => "cent".to_string(),
        (1, rest) => format!("cent {}", fr_below_100(rest)),
        (hundreds, 0) => format!("{} cents", FR_UNITS[hundreds as usize]),
        (hundreds, rest) => format!("{} cent {}", FR_UNITS[hundreds as usize], fr_below_100(rest)),
    }
}

fn french(n: u64) -> String {
    if n == 0 {
        return FR_UNITS[0].to_string();
    }

    let groups = thousands_groups(n);
    let mut parts = Vec::new();
    for (scale, &group) in groups.iter().enumerate().rev() {
        if group == 0 {
            continue;
        }
        let words = match (scale, group) {
            (0, g) => fr_below_1000(g),
            (1, 1) => "mille".to_string(),
            // "deux cent mille", "quatre-vingt mille": no plural before mille
            (1, g) => {
                let mut words = fr_below_1000(g);
                if words.ends_with("cents") || words.ends_with("vingts") {
                    words.pop();
                }
                format!("{} mille", words)
            }
            (s, 1) => format!("un {}", FR_SCALES[s].0),
            (s, g) => format!("{} {}", fr_below_1000(g), FR_SCALES[s].1),
        };
        parts.push(words);
    }
    parts.join(" ")
}

// German

const DE_UNITS: [&str; 20] = [
    "null", "eins", "zwei", "drei", "vier", "fünf", "sechs", "sieben", "acht", "neun", "zehn", "elf", "zwölf",
    "dreizehn", "vierzehn", "fünfzehn", "sechzehn", "siebzehn", "achtzehn", "neunzehn",
];
const DE_TENS: [&str; 10] = [
    "", "", "zwanzig", "dreißig", "vierzig", "fünfzig", "sechzig", "siebzig", "achtzig", "neunzig",
];
const DE_SCALES: [(&str, &str); 7] = [
    ("", ""),
    ("tausend", "tausend"),
    ("Million", "Millionen"),
    ("Milliarde", "Milliarden"),
    ("Billion", "Billionen"),
    ("Billiarde", "Billiarden"),
    ("Trillion", "Trillionen"),
];

fn de_below_100(n: u64) -> String {
    if n < 20 {
        return DE_UNITS[n as usize].to_string();
    }
    match n % 10 {
        0 => DE_TENS[(n / 10) as usize].to_string(),
        1 => format!("einund{}", DE_TENS[(n / 10) as usize]),
        unit => format!("{}und{}", DE_UNITS[unit as usize], DE_TENS[(n / 10) as usize]),
    }
}

fn de_below_1000(n: u64) -> String {
    let (hundreds, rest) = (n / 100, n % 100);
    let mut words = String::new();
    if hundreds > 0 {
        words.push_str(if hundreds == 1 { "ein" } else { DE_UNITS[hundreds as usize] });
        words.push_str("hundert");
    }
    if rest > 0 || hundreds == 0 {
        words.push_str(&de_below_100(rest));
    }
    words
}

/// Trailing "eins" becomes "ein" when it multiplies a following word
fn de_multiplier(n: u64) -> String {
    let words = de_below_1000(n);
    match words.strip_suffix("eins") {
        Some(stem) => format!("{}ein", stem),
        None => words,
    }
}

/// Before the feminine scale nouns: "einhunderteine Millionen"
fn de_feminine(n: u64) -> String {
    let words = de_below_1000(n);
    if words.ends_with("eins") {
        format!("{}e", de_multiplier(n))
    } else {
        words
    }
}

fn german(n: u64) -> String {
    if n == 0 {
        return DE_UNITS[0].to_string();
    }

    let groups = thousands_groups(n);
    let mut large = Vec::new();
    for scale in (2..groups.len()).rev() {
        match groups[scale] {
            0 => {}
            1 => large.push(format!("eine {}", DE_SCALES[scale].0)),
            g => large.push(format!("{} {}", de_feminine(g), DE_SCALES[scale].1)),
        }
    }

    // Below a million everything is written as one word
    let mut small = String::new();
    if groups.len() > 1 && groups[1] > 0 {
        small.push_str(&de_multiplier(groups[1]));
        small.push_str("tausend");
    }
    if groups[0] > 0 {
        small.push_str(&de_below_1000(groups[0]));
    }
    if !small.is_empty() {
        large.push(small);
    }
    large.join(" ")
}

// Italian

const IT_UNITS: [&str; 20] = [
    "zero", "uno", "due", "tre", "quattro", "cinque", "sei", "sette", "otto", "nove", "dieci", "undici",
    "dodici", "tredici", "quattordici", "quindici", "sedici", "diciassette", "diciotto", "diciannove",
];
const IT_TENS: [&str; 10] = [
    "", "", "venti", "trenta", "quaranta", "cinquanta", "sessanta", "settanta", "ottanta", "novanta",
];
const IT_SCALES: [(&str, &str); 7] = [
    ("", ""),
    ("mille", "mila"),
    ("milione", "milioni"),
    ("miliardo", "miliardi"),
    ("bilione", "bilioni"),
    ("biliardo", "biliardi"),
    ("trilione", "trilioni"),
];

fn it_below_100(n: u64) -> String {
    if n < 20 {
        return IT_UNITS[n as usize].to_string();
    }
    let tens = IT_TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        // "ventuno", "trentotto": the tens drop their final vowel
        unit @ (1 | 8) => format!("{}{}", &tens[..tens.len() - 1], IT_UNITS[unit as usize]),
        3 => format!("{}tré", tens),
        unit => format!("{}{}", tens, IT_UNITS[unit as usize]),
    }
}

fn it_below_1000(n: u64) -> String {
    let (hundreds, rest) = (n / 100, n % 100);
    if hundreds == 0 {
        return it_below_100(rest);
    }
    let prefix = if hundreds == 1 {
        "cento".to_string()
    } else {
        format!("{}cento", IT_UNITS[hundreds as usize])
    };
    match rest {
        0 => prefix,
        3 => format!("{}tré", prefix),
        _ => {
            let rest_words = it_below_100(rest);
            if rest_words.starts_with('o') {
                format!("{}{}", &prefix[..prefix.len() - 1], rest_words)
            } else {
                format!("{}{}", prefix, rest_words)
            }
        }
    }
}

fn italian(n: u64) -> String {
    if n == 0 {
        return IT_UNITS[0].to_string();
    }

    let groups = thousands_groups(n);
    let mut large = Vec::new();
    for scale in (2..groups.len()).rev() {
        match groups[scale] {
            0 => {}
            1 => large.push(format!("un {}", IT_SCALES[scale].0)),
            g => large.push(format!("{} {}", it_below_1000(g), IT_SCALES[scale].1)),
        }
    }

    let mut small = String::new();
    if groups.len() > 1 {
        match groups[1] {
            0 => {}
            1 => small.push_str(IT_SCALES[1].0),
            g => {
                small.push_str(&it_below_1000(g));
                small.push_str(IT_SCALES[1].1);
            }
        }
    }
    if groups[0] > 0 {
        small.push_str(&it_below_1000(groups[0]));
    }
    if !small.is_empty() {
        large.push(small);
    }
    large.join(" ")
}

// Portuguese (European, long scale)

const PT_UNITS: [&str; 20] = [
    "zero", "um", "dois", "três", "quatro", "cinco", "seis", "sete", "oito", "nove", "dez", "onze", "doze",
    "treze", "catorze", "quinze", "dezasseis", "dezassete", "dezoito", "dezanove",
];
const PT_TENS: [&str; 10] = [
    "", "", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta", "noventa",
];
const PT_HUNDREDS: [&str; 10] = [
    "", "cento", "duzentos", "trezentos", "quatrocentos", "quinhentos", "seiscentos", "setecentos",
    "oitocentos", "novecentos",
];
const PT_SCALES: [(u64, &str, &str); 3] = [
    (1_000_000_000_000_000_000, "trilião", "triliões"),
    (1_000_000_000_000, "bilião", "biliões"),
    (1_000_000, "milhão", "milhões"),
];

fn pt_below_100(n: u64) -> String {
    if n < 20 {
        return PT_UNITS[n as usize].to_string();
    }
    match n % 10 {
        0 => PT_TENS[(n / 10) as usize].to_string(),
        unit => format!("{} e {}", PT_TENS[(n / 10) as usize], PT_UNITS[unit as usize]),
    }
}

fn pt_below_1000(n: u64) -> String {
    match (n / 100, n % 100) {
        (0, rest) => pt_below_100(rest),
        (1, 0) => "cem".to_string(),
        (hundreds, 0) => PT_HUNDREDS[hundreds as usize].to_string(),
        (hundreds, rest) => format!("{} e {}", PT_HUNDREDS[hundreds as usize], pt_below_100(rest)),
    }
}

/// "mil e um", "mil e cem", but "mil duzentos e trinta"
fn pt_joiner(rest: u64) -> &'static str {
    if rest < 100 || (rest < 1000 && rest % 100 == 0) {
        " e "
    } else {
        " "
    }
}

fn pt_below_million(n: u64) -> String {
    let (thousands, rest) = (n / 1000, n % 1000);
    let head = match thousands {
        0 => return pt_below_1000(rest),
        1 => "mil".to_string(),
        t => format!("{} mil", pt_below_1000(t)),
    };
    if rest == 0 {
        head
    } else {
        format!("{}{}{}", head, pt_joiner(rest), pt_below_1000(rest))
    }
}

fn portuguese(n: u64) -> String {
    let mut out = String::new();
    let mut rest = n;
    for (value, singular, plural) in PT_SCALES {
        let count = rest / value;
        rest %= value;
        let words = match count {
            0 => continue,
            1 => format!("um {}", singular),
            c => format!("{} {}", pt_below_million(c), plural),
        };
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&words);
    }

    if out.is_empty() {
        return pt_below_million(rest);
    }
    if rest > 0 {
        out.push_str(pt_joiner(rest));
        out.push_str(&pt_below_million(rest));
    }
    out
}

// Russian

const RU_UNITS: [&str; 20] = [
    "ноль", "один", "два", "три", "четыре", "пять", "шесть", "семь", "восемь", "девять", "десять",
    "одиннадцать", "двенадцать", "тринадцать", "четырнадцать", "пятнадцать", "шестнадцать", "семнадцать",
    "восемнадцать", "девятнадцать",
];
const RU_TENS: [&str; 10] = [
    "", "", "двадцать", "тридцать", "сорок", "пятьдесят", "шестьдесят", "семьдесят", "восемьдесят", "девяносто",
];
const RU_HUNDREDS: [&str; 10] = [
    "", "сто", "двести", "триста", "четыреста", "пятьсот", "шестьсот", "семьсот", "восемьсот", "девятьсот",
];
/// Noun forms after a count: (1, 2-4, 5-20)
const RU_SCALES: [(&str, &str, &str); 7] = [
    ("", "", ""),
    ("тысяча", "тысячи", "тысяч"),
    ("миллион", "миллиона", "миллионов"),
    ("миллиард", "миллиарда", "миллиардов"),
    ("триллион", "триллиона", "триллионов"),
    ("квадриллион", "квадриллиона", "квадриллионов"),
    ("квинтиллион", "квинтиллиона", "квинтиллионов"),
];

/// тысяча is feminine: "одна тысяча", "две тысячи"
fn ru_unit(n: u64, feminine: bool) -> &'static str {
    match (n, feminine) {
        (1, true) => "одна",
        (2, true) => "две",
        _ => RU_UNITS[n as usize],
    }
}

fn ru_below_1000(n: u64, feminine: bool) -> String {
    let mut words = Vec::new();
    if n >= 100 {
        words.push(RU_HUNDREDS[(n / 100) as usize]);
    }
    let rest = n % 100;
    if rest >= 20 {
        words.push(RU_TENS[(rest / 10) as usize]);
        if rest % 10 > 0 {
            words.push(ru_unit(rest % 10, feminine));
        }
    } else if rest > 0 {
        words.push(ru_unit(rest, feminine));
    }
    words.join(" ")
}

fn ru_plural(n: u64, forms: (&'static str, &'static str, &'static str)) -> &'static str {
    match (n % 100, n % 10) {
        (11..=14, _) => forms.2,
        (_, 1) => forms.0,
        (_, 2..=4) => forms.1,
        _ => forms.2,
    }
}

fn russian(n: u64) -> String {
    if n == 0 {
        return RU_UNITS[0].to_string();
    }

    let groups = thousands_groups(n);
    let mut parts = Vec::new();
    for (scale, &group) in groups.iter().enumerate().rev() {
        if group == 0 {
            continue;
        }
        let words = ru_below_1000(group, scale == 1);
        parts.push(if scale == 0 {
            words
        } else {
            format!("{} {}", words, ru_plural(group, RU_SCALES[scale]))
        });
    }
    parts.join(" ")
}

// Arabic (Modern Standard, masculine counting forms)

const AR_UNITS: [&str; 11] = [
    "صفر", "واحد", "اثنان", "ثلاثة", "أربعة", "خمسة", "ستة", "سبعة", "ثمانية", "تسعة", "عشرة",
];
const AR_TENS: [&str; 10] = ["", "", "عشرون", "ثلاثون", "أربعون", "خمسون", "ستون", "سبعون", "ثمانون", "تسعون"];
const AR_HUNDREDS: [&str; 10] = [
    "", "مائة", "مئتان", "ثلاثمائة", "أربعمائة", "خمسمائة", "ستمائة", "سبعمائة", "ثمانمائة", "تسعمائة",
];
/// (singular, dual, plural for 3-10, accusative singular for 11-99)
const AR_SCALES: [(&str, &str, &str, &str); 7] = [
    ("", "", "", ""),
    ("ألف", "ألفان", "آلاف", "ألفاً"),
    ("مليون", "مليونان", "ملايين", "مليوناً"),
    ("مليار", "ملياران", "مليارات", "ملياراً"),
    ("تريليون", "تريليونان", "تريليونات", "تريليوناً"),
    ("كوادريليون", "كوادريليونان", "كوادريليونات", "كوادريليوناً"),
    ("كوينتليون", "كوينتليونان", "كوينتليونات", "كوينتليوناً"),
];

fn ar_below_100(n: u64) -> String {
    match n {
        0..=10 => AR_UNITS[n as usize].to_string(),
        11 => "أحد عشر".to_string(),
        12 => "اثنا عشر".to_string(),
        13..=19 => format!("{} عشر", AR_UNITS[(n - 10) as usize]),
        _ => {
            let tens = AR_TENS[(n / 10) as usize];
            match n % 10 {
                0 => tens.to_string(),
                unit => format!("{} و {}", AR_UNITS[unit as usize], tens),
            }
        }
    }
}

fn ar_below_1000(n: u64) -> String {
    match (n / 100, n % 100) {
        (0, rest) => ar_below_100(rest),
        (hundreds, 0) => AR_HUNDREDS[hundreds as usize].to_string(),
        (hundreds, rest) => format!("{} و {}", AR_HUNDREDS[hundreds as usize], ar_below_100(rest)),
    }
}

/// A count of a scale noun; the noun's form depends on the last two digits
fn ar_scaled(count: u64, forms: (&str, &str, &str, &str)) -> String {
    let (hundreds, rest) = (count - count % 100, count % 100);
    match rest {
        0 => format!("{} {}", ar_below_1000(count), forms.0),
        1 | 2 => {
            let noun = if rest == 1 { forms.0 } else { forms.1 };
            if hundreds == 0 {
                noun.to_string()
            } else {
                format!("{} و {}", ar_below_1000(hundreds), noun)
            }
        }
        3..=10 => format!("{} {}", ar_below_1000(count), forms.2),
        _ => format!("{} {}", ar_below_1000(count), forms.3),
    }
}

fn arabic(n: u64) -> String {
    if n == 0 {
        return AR_UNITS[0].to_string();
    }

    let groups = thousands_groups(n);
    let mut parts = Vec::new();
    for (scale, &group) in groups.iter().enumerate().rev() {
        if group == 0 {
            continue;
        }
        parts.push(if scale == 0 {
            ar_below_1000(group)
        } else {
            ar_scaled(group, AR_SCALES[scale])
        });
    }
    parts.join(" و ")
}
