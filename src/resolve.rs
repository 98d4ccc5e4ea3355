//! Person-name resolution: Korean surface form to a canonical searchable
//! English name. Lexicon first, then the external lookup, then machine
//! translation, and finally the original string — the chain never fails.

use tracing::warn;

use crate::capability::{NameLookup, Translator};

/// Korean spelling → canonical English search name for public figures that
/// show up constantly in the corpus. Checked before any network call.
pub static NAME_LEXICON: &[(&str, &str)] = &[
    // United States
    ("트럼프", "Donald Trump"),
    ("도널드 트럼프", "Donald Trump"),
    ("도널드 J 트럼프", "Donald Trump"),
    ("조 바이든", "Joe Biden"),
    ("바이든", "Joe Biden"),
    ("카멀라 해리스", "Kamala Harris"),
    ("해리스", "Kamala Harris"),
    ("앤터니 블링컨", "Antony Blinken"),
    ("토니 블링컨", "Antony Blinken"),
    // China
    ("시진핑", "Xi Jinping"),
    ("리창", "Li Qiang"),
    ("왕이", "Wang Yi"),
    // Russia / Ukraine
    ("블라디미르 푸틴", "Vladimir Putin"),
    ("푸틴", "Vladimir Putin"),
    ("볼로디미르 젤렌스키", "Volodymyr Zelenskyy"),
    ("젤렌스키", "Volodymyr Zelenskyy"),
    // Israel / Iran
    ("베냐민 네타냐후", "Benjamin Netanyahu"),
    ("비비 네타냐후", "Benjamin Netanyahu"),
    ("네타냐후", "Benjamin Netanyahu"),
    ("알리 하메네이", "Ali Khamenei"),
    ("하메네이", "Ali Khamenei"),
    // Europe / Japan
    ("기어 스타머", "Keir Starmer"),
    ("키어 스타머", "Keir Starmer"),
    ("에마뉘엘 마크롱", "Emmanuel Macron"),
    ("마크롱", "Emmanuel Macron"),
    ("올라프 숄츠", "Olaf Scholz"),
    ("숄츠", "Olaf Scholz"),
    ("기시다 후미오", "Fumio Kishida"),
    ("기시다", "Fumio Kishida"),
    // Korean peninsula
    ("윤석열", "Yoon Suk Yeol"),
    ("이재명", "Lee Jae-myung"),
    ("한덕수", "Han Duck-soo"),
    ("조태열", "Cho Tae-yul"),
    ("김정은", "Kim Jong-un"),
    ("김여정", "Kim Yo-jong"),
    // International organizations
    ("안토니우 구테흐스", "António Guterres"),
    ("구테흐스", "António Guterres"),
    ("옌스 스톨텐베르그", "Jens Stoltenberg"),
    ("스톨텐베르그", "Jens Stoltenberg"),
    ("테워드로스 아드하놈 거브러여수스", "Tedros Adhanom Ghebreyesus"),
    ("테워드로스", "Tedros Adhanom Ghebreyesus"),
];

/// Exact match first, then substring: a lexicon key contained in the input
/// still resolves, which handles titles and honorifics glued to the name
/// ("이스라엘의 네타냐후 총리").
fn lexicon_lookup(name_ko: &str) -> Option<&'static str> {
    for (ko, en) in NAME_LEXICON {
        if *ko == name_ko {
            return Some(en);
        }
    }
    for (ko, en) in NAME_LEXICON {
        if name_ko.contains(ko) {
            return Some(en);
        }
    }
    None
}

/// Resolve a Korean person name to an English searchable form. Always
/// returns a usable string; external failures fall through to the next
/// stage and ultimately to the original input.
pub async fn resolve_person_name(
    name_ko: &str,
    lookup: &impl NameLookup,
    translator: &impl Translator,
) -> String {
    let name_ko = name_ko.trim();
    if name_ko.is_empty() {
        return String::new();
    }

    if let Some(en) = lexicon_lookup(name_ko) {
        return en.to_string();
    }

    match lookup.lookup(name_ko).await {
        Ok(Some(en)) if !en.trim().is_empty() => return en,
        Ok(_) => {}
        Err(e) => warn!(name = %name_ko, error = %e, "name lookup failed, trying translation"),
    }

    match translator.translate(name_ko).await {
        Ok(en) if !en.trim().is_empty() => en,
        Ok(_) => name_ko.to_string(),
        Err(e) => {
            warn!(name = %name_ko, error = %e, "name translation failed, keeping original");
            name_ko.to_string()
        }
    }
}
