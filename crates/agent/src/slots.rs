//! Slot detectors: extract event facts from a single message.
//!
//! Keyword detectors work on [`Utterance`] tokens. Structural detectors
//! (dates, times, postal codes, addresses) run compiled patterns over the
//! folded text so punctuation such as `12/06` or `18:30` survives.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use soundrent_core::cpq::pricing::department_from_postal_code;
use soundrent_core::text::{fold, normalize, Utterance};
use soundrent_core::{Ambiance, DeliveryChoice, Environment, EventKind, Need};

/// Facts the assistant collects before it can draft an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotKey {
    EventType,
    PeopleCount,
    IndoorOutdoor,
    Ambiance,
    StartDate,
    EndDate,
    StartTime,
    EndTime,
    DeliveryChoice,
    Department,
}

impl SlotKey {
    /// Order in which missing slots are asked for.
    pub const CANONICAL: [SlotKey; 10] = [
        SlotKey::EventType,
        SlotKey::PeopleCount,
        SlotKey::IndoorOutdoor,
        SlotKey::Ambiance,
        SlotKey::StartDate,
        SlotKey::EndDate,
        SlotKey::StartTime,
        SlotKey::EndTime,
        SlotKey::DeliveryChoice,
        SlotKey::Department,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::EventType => "event_type",
            Self::PeopleCount => "people_count",
            Self::IndoorOutdoor => "indoor_outdoor",
            Self::Ambiance => "ambiance",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::StartTime => "start_time",
            Self::EndTime => "end_time",
            Self::DeliveryChoice => "delivery_choice",
            Self::Department => "department",
        }
    }
}

/// Everything one message states about the event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotMentions {
    pub people_count: Option<u32>,
    pub environment: Option<Environment>,
    pub event_type: Option<EventKind>,
    pub ambiance: Option<Ambiance>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub delivery_choice: Option<DeliveryChoice>,
    pub department: Option<String>,
    pub address: Option<String>,
    pub with_installation: Option<bool>,
    pub needs: BTreeSet<Need>,
}

/// Runs every detector over `raw`. Dates without a year resolve against
/// `reference`.
pub fn detect(raw: &str, reference: NaiveDate) -> SlotMentions {
    let utterance = Utterance::new(raw);
    let folded = fold(raw);
    let (start_date, end_date) = dates(&folded, &utterance, reference);
    let (start_time, end_time) = times(&folded);
    let address = address(raw);
    let department = department(&folded, &utterance);

    SlotMentions {
        people_count: people_count(raw),
        environment: environment(&utterance),
        event_type: event_kind(&utterance),
        ambiance: ambiance(&utterance),
        start_date,
        end_date,
        start_time,
        end_time,
        delivery_choice: delivery_choice(&utterance),
        department,
        address,
        with_installation: installation(&utterance),
        needs: needs(&utterance),
    }
}

static PEOPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,4})(?:(?:\s*-\s*|\s+(?:a|et|ou)\s+)(\d{1,4}))?\s*(?:personnes?|pers|invites?|convives?|participants?|gens|pax|adultes?|guests?)\b",
    )
    .expect("people count pattern")
});

static APPROXIMATE_PEOPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(une|deux|trois|quatre|cinq)?\s*(dizaine|vingtaine|trentaine|quarantaine|cinquantaine|soixantaine|centaine)s?\b",
    )
    .expect("approximate count pattern")
});

struct Headcount {
    position: usize,
    count: u32,
    exact: bool,
}

/// Headcount mentions in order. Numeric dates are blanked first so a year
/// never reads as part of a range.
fn headcounts(raw: &str) -> Vec<Headcount> {
    let folded = fold(raw);
    let text = NUMERIC_DATE.replace_all(&folded, " ");

    let mut found = PEOPLE
        .captures_iter(&text)
        .filter_map(|captures| {
            let low = captures.get(1)?.as_str().parse::<u32>().ok()?;
            let high = captures.get(2).and_then(|high| high.as_str().parse::<u32>().ok());
            Some(Headcount {
                position: captures.get(0)?.start(),
                count: high.map_or(low, |high| high.max(low)),
                exact: high.is_none(),
            })
        })
        .collect::<Vec<_>>();

    found.extend(APPROXIMATE_PEOPLE.captures_iter(&text).filter_map(|captures| {
        let factor = match captures.get(1).map(|m| m.as_str()) {
            None | Some("une") => 1,
            Some("deux") => 2,
            Some("trois") => 3,
            Some("quatre") => 4,
            Some(_) => 5,
        };
        let base = match captures.get(2)?.as_str() {
            "dizaine" => 10,
            "vingtaine" => 20,
            "trentaine" => 30,
            "quarantaine" => 40,
            "cinquantaine" => 50,
            "soixantaine" => 60,
            _ => 100,
        };
        Some(Headcount { position: captures.get(0)?.start(), count: base * factor, exact: false })
    }));

    found.sort_by_key(|headcount| headcount.position);
    found
}

/// Headcount stated in `raw`. Ranges keep their upper bound and the last
/// mention wins.
pub fn people_count(raw: &str) -> Option<u32> {
    headcounts(raw).last().map(|headcount| headcount.count)
}

/// A single explicit headcount such as `vos 120 invites`. Capacity ranges
/// and approximations are left out.
pub fn stated_people_count(raw: &str) -> Option<u32> {
    match headcounts(raw).as_slice() {
        [only] if only.exact => Some(only.count),
        _ => None,
    }
}

pub fn environment(utterance: &Utterance) -> Option<Environment> {
    let indoor = utterance.has_any_word(&["interieur", "dedans"])
        || utterance.has_any_phrase(&["en salle", "dans une salle", "salle des fetes"]);
    let outdoor = utterance.has_any_word(&["exterieur", "dehors", "jardin", "terrasse", "plage"])
        || utterance.has_phrase("plein air");

    match (indoor, outdoor) {
        (true, false) => Some(Environment::Indoor),
        (false, true) => Some(Environment::Outdoor),
        _ => None,
    }
}

pub fn event_kind(utterance: &Utterance) -> Option<EventKind> {
    if utterance.has_any_word(&["mariage", "mariages", "noces", "mariee", "maries"]) {
        return Some(EventKind::Wedding);
    }
    if utterance.has_any_word(&["anniversaire", "anniv"]) {
        return Some(EventKind::Birthday);
    }
    if utterance.has_any_word(&["entreprise", "afterwork", "cse", "corporate", "societe"])
        || utterance.has_phrase("team building")
    {
        return Some(EventKind::Corporate);
    }
    if utterance.has_any_word(&["conference", "seminaire", "colloque", "congres", "assemblee"]) {
        return Some(EventKind::Conference);
    }
    if utterance.has_any_word(&["ceremonie", "bapteme", "communion", "obseques", "enterrement"])
        || utterance.has_any_phrase(&["bar mitzvah", "bat mitzvah"])
    {
        return Some(EventKind::ReligiousCeremony);
    }
    let party_word = utterance.has_any_word(&["soiree", "teuf", "cremaillere", "party"])
        || (utterance.has_word("fete") && !utterance.has_phrase("salle des fetes"));
    if party_word {
        return Some(EventKind::PrivateParty);
    }
    None
}

pub fn ambiance(utterance: &Utterance) -> Option<Ambiance> {
    if utterance.has_any_word(&["festive", "festif", "danser", "dansante", "dancefloor"])
        || utterance.has_phrase("faire la fete")
    {
        return Some(Ambiance::Festive);
    }
    if utterance.has_any_word(&["lounge", "calme", "cocktail", "tamisee"])
        || utterance.has_any_phrase(&["musique d ambiance", "fond sonore", "musique de fond"])
    {
        return Some(Ambiance::Lounge);
    }
    if utterance.has_any_word(&["discours", "speech", "allocution"])
        || utterance.has_phrase("prise de parole")
    {
        return Some(Ambiance::Speech);
    }
    None
}

const MONTHS: &str =
    "janvier|fevrier|mars|avril|mai|juin|juillet|aout|septembre|octobre|novembre|decembre";

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/.](\d{1,2})(?:[/.](\d{4}|\d{2}))?\b").expect("numeric date pattern")
});

static TEXT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(\d{{1,2}})(?:er)?\s+({MONTHS})(?:\s+(\d{{4}}))?\b"))
        .expect("text date pattern")
});

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\bdu\s+(\d{{1,2}})(?:er)?\s+(?:au|a)\s+(\d{{1,2}})(?:er)?\s+({MONTHS})(?:\s+(\d{{4}}))?\b"
    ))
    .expect("date range pattern")
});

fn month_number(name: &str) -> Option<u32> {
    let index = MONTHS.split('|').position(|month| month == name)?;
    u32::try_from(index + 1).ok()
}

fn parse_year(raw: Option<&str>) -> Option<i32> {
    let value = raw?.parse::<i32>().ok()?;
    Some(if value < 100 { 2000 + value } else { value })
}

/// Explicit year wins; otherwise the next occurrence on or after `reference`.
fn resolve_date(day: u32, month: u32, year: Option<i32>, reference: NaiveDate) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    let candidate = NaiveDate::from_ymd_opt(reference.year(), month, day)?;
    if candidate < reference {
        NaiveDate::from_ymd_opt(reference.year() + 1, month, day)
    } else {
        Some(candidate)
    }
}

/// Start and end dates mentioned in the folded text. A single-day phrasing
/// copies the start date into the end date.
pub fn dates(
    folded: &str,
    utterance: &Utterance,
    reference: NaiveDate,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    if let Some(captures) = DATE_RANGE.captures(folded) {
        let parse = |index: usize| captures.get(index).and_then(|m| m.as_str().parse::<u32>().ok());
        let month = captures.get(3).and_then(|m| month_number(m.as_str()));
        let year = parse_year(captures.get(4).map(|m| m.as_str()));
        if let (Some(first), Some(last), Some(month)) = (parse(1), parse(2), month) {
            let end = resolve_date(last, month, year, reference);
            let start = end.and_then(|end| NaiveDate::from_ymd_opt(end.year(), month, first));
            if let (Some(start), Some(end)) = (start, end) {
                if start <= end {
                    return (Some(start), Some(end));
                }
            }
        }
    }

    let mut found = Vec::new();
    for captures in NUMERIC_DATE.captures_iter(folded) {
        let day = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        let month = captures.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let year = parse_year(captures.get(3).map(|m| m.as_str()));
        if let (Some(day), Some(month), Some(whole)) = (day, month, captures.get(0)) {
            if let Some(date) = resolve_date(day, month, year, reference) {
                found.push((whole.start(), date));
            }
        }
    }
    for captures in TEXT_DATE.captures_iter(folded) {
        let day = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        let month = captures.get(2).and_then(|m| month_number(m.as_str()));
        let year = parse_year(captures.get(3).map(|m| m.as_str()));
        if let (Some(day), Some(month), Some(whole)) = (day, month, captures.get(0)) {
            if let Some(date) = resolve_date(day, month, year, reference) {
                found.push((whole.start(), date));
            }
        }
    }
    found.sort_by_key(|(position, _)| *position);

    let mut start = found.first().map(|(_, date)| *date);
    let mut end = found.get(1).map(|(_, date)| *date).filter(|end| Some(*end) >= start);
    if start.is_none() {
        start = relative_date(utterance, reference);
    }
    if end.is_none() && start.is_some() && single_day(utterance) {
        end = start;
    }
    (start, end)
}

fn relative_date(utterance: &Utterance, reference: NaiveDate) -> Option<NaiveDate> {
    if utterance.has_phrase("apres demain") {
        return reference.checked_add_days(Days::new(2));
    }
    if utterance.has_word("demain") {
        return reference.checked_add_days(Days::new(1));
    }
    if utterance.has_any_phrase(&["aujourd hui", "ce soir"]) {
        return Some(reference);
    }

    const WEEKDAYS: [(&str, Weekday); 7] = [
        ("lundi", Weekday::Mon),
        ("mardi", Weekday::Tue),
        ("mercredi", Weekday::Wed),
        ("jeudi", Weekday::Thu),
        ("vendredi", Weekday::Fri),
        ("samedi", Weekday::Sat),
        ("dimanche", Weekday::Sun),
    ];
    let (_, weekday) = WEEKDAYS.iter().find(|(name, _)| utterance.has_word(name))?;
    let mut ahead = (7 + weekday.num_days_from_monday() - reference.weekday().num_days_from_monday()) % 7;
    if ahead == 0 && utterance.has_word("prochain") {
        ahead = 7;
    }
    reference.checked_add_days(Days::new(u64::from(ahead)))
}

fn single_day(utterance: &Utterance) -> bool {
    utterance.has_any_phrase(&[
        "une seule journee",
        "un seul jour",
        "le meme jour",
        "sur une journee",
        "une journee",
        "le soir meme",
        "juste la soiree",
        "la soiree seulement",
    ])
}

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([01]?\d|2[0-3])\s*(?:heures?|h|:)\s*([0-5]\d)?\b").expect("clock time pattern")
});

static NAMED_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(minuit|midi)\b").expect("named time pattern"));

/// Start and end times. Durations (`dans 2 heures`, `pendant 5h`) are
/// ignored; a lone `jusqu'a 2h` is an end time.
pub fn times(folded: &str) -> (Option<NaiveTime>, Option<NaiveTime>) {
    let mut found = Vec::new();

    for captures in CLOCK_TIME.captures_iter(folded) {
        let Some(whole) = captures.get(0) else { continue };
        let prefix = &folded[..whole.start()];
        if ["dans ", "pendant ", "durant "].iter().any(|word| prefix.ends_with(word)) {
            continue;
        }
        let hour = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        let minute = captures.get(2).map_or(Some(0), |m| m.as_str().parse::<u32>().ok());
        if let Some(time) = hour.zip(minute).and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)) {
            found.push((whole.start(), time));
        }
    }
    for captures in NAMED_TIME.captures_iter(folded) {
        let Some(whole) = captures.get(0) else { continue };
        let hour = if whole.as_str() == "midi" { 12 } else { 0 };
        if let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) {
            found.push((whole.start(), time));
        }
    }
    found.sort_by_key(|(position, _)| *position);

    match found.as_slice() {
        [] => (None, None),
        [(position, only)] => {
            let prefix = &folded[..*position];
            let closing = ["jusqu'a ", "jusqu a ", "fin a ", "termine a ", "finit a "]
                .iter()
                .any(|word| prefix.ends_with(word));
            if closing {
                (None, Some(*only))
            } else {
                (Some(*only), None)
            }
        }
        [(_, first), (_, second), ..] => (Some(*first), Some(*second)),
    }
}

static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{5})\b(\s*(?:€|euros?\b|eur\b|ht\b|ttc\b|k\b))?").expect("postal code pattern")
});

const AMOUNT_WORDS: &[&str] = &["budget", "prix", "tarif", "montant", "maximum", "max", "environ"];

/// Five digits read as a postal code unless they are an amount.
fn postal_code(folded: &str, captures: &regex::Captures<'_>) -> Option<String> {
    if captures.get(2).is_some() {
        return None;
    }
    let code = captures.get(1)?;
    let amount = folded[..code.start()]
        .split_whitespace()
        .rev()
        .take(3)
        .any(|word| AMOUNT_WORDS.contains(&word.trim_matches(|c: char| !c.is_alphanumeric())));
    if amount {
        return None;
    }
    department_from_postal_code(code.as_str())
}

static DEPARTMENT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:departement|dept|dpt)\.?\s*(?:du\s+|de\s+la\s+|de\s+l'|de\s+|:\s*)?(\d{2,3}|2a|2b)\b")
        .expect("department pattern")
});

const CITY_DEPARTMENTS: &[(&str, &str)] = &[
    ("paris", "75"),
    ("boulogne billancourt", "92"),
    ("nanterre", "92"),
    ("neuilly sur seine", "92"),
    ("saint denis", "93"),
    ("montreuil", "93"),
    ("creteil", "94"),
    ("vincennes", "94"),
    ("versailles", "78"),
    ("evry", "91"),
    ("cergy", "95"),
    ("melun", "77"),
    ("lyon", "69"),
    ("marseille", "13"),
    ("lille", "59"),
    ("bordeaux", "33"),
    ("toulouse", "31"),
    ("nantes", "44"),
];

/// Department from a postal code, an explicit `departement 92`, or a known
/// city name, in that order.
pub fn department(folded: &str, utterance: &Utterance) -> Option<String> {
    if let Some(department) = POSTAL_CODE
        .captures_iter(folded)
        .filter_map(|captures| postal_code(folded, &captures))
        .last()
    {
        return Some(department);
    }
    if let Some(captures) = DEPARTMENT_NUMBER.captures(folded) {
        return captures.get(1).map(|m| m.as_str().to_ascii_uppercase());
    }
    CITY_DEPARTMENTS
        .iter()
        .find(|(city, _)| utterance.has_phrase(city))
        .map(|(_, department)| department.to_string())
}

static STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,4}(?:\s*(?:bis|ter))?,?\s+(?:rue|avenue|av\.|boulevard|bd|place|chemin|all[ée]e|impasse|route|quai|cours|square|villa)\s+[^\n.;!?]+",
    )
    .expect("street address pattern")
});

/// Street address as the customer wrote it.
pub fn address(raw: &str) -> Option<String> {
    let found = STREET_ADDRESS.find(raw)?;
    let trimmed = found.as_str().trim().trim_end_matches([',', ' ']);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn delivery_choice(utterance: &Utterance) -> Option<DeliveryChoice> {
    if utterance.has_any_phrase(&["sans livraison", "pas de livraison", "pas besoin de livraison"]) {
        return Some(DeliveryChoice::Pickup);
    }
    if utterance.has_word("retrait")
        || utterance.has_any_phrase(&[
            "venir chercher",
            "viens chercher",
            "viendrai chercher",
            "viendrons chercher",
            "passer chercher",
            "passe chercher",
            "recuperer le materiel",
            "je recupere",
            "on recupere",
            "a emporter",
            "en boutique",
        ])
    {
        return Some(DeliveryChoice::Pickup);
    }
    if utterance.has_any_word(&["livraison", "livrer", "livrez", "livre", "livree", "livres"]) {
        return Some(DeliveryChoice::Delivery);
    }
    None
}

pub fn installation(utterance: &Utterance) -> Option<bool> {
    if utterance.has_any_phrase(&[
        "sans installation",
        "pas d installation",
        "pas besoin d installation",
        "pas besoin d installer",
        "on installe nous meme",
        "on installera nous meme",
        "j installe moi meme",
        "je m occupe de l installation",
        "nous nous occupons de l installation",
    ]) {
        return Some(false);
    }
    if utterance.has_any_word(&["installation", "installer", "installez", "montage", "technicien"])
        || utterance.has_phrase("mise en place")
    {
        return Some(true);
    }
    None
}

pub fn needs(utterance: &Utterance) -> BTreeSet<Need> {
    let mut needs = BTreeSet::new();

    if utterance.has_any_word(&["sono", "sonorisation", "enceinte", "enceintes", "son"]) {
        needs.insert(Need::Sound);
    }
    if utterance.has_any_word(&["dj", "platine", "platines", "controleur"]) {
        needs.insert(Need::Dj);
    }
    if utterance.has_any_phrase(&["micro sans fil", "micros sans fil", "micro hf", "micros hf"]) {
        needs.insert(Need::WirelessMicrophone);
    } else if utterance.has_any_word(&["micro", "micros", "microphone", "microphones"]) {
        needs.insert(Need::Microphone);
    }
    if utterance.has_any_word(&["lumiere", "lumieres", "eclairage", "projecteurs", "laser", "lasers", "spots"]) {
        needs.insert(Need::Lighting);
    }
    if utterance.has_word("karaoke") {
        needs.insert(Need::Karaoke);
    }
    if utterance.has_any_word(&["basses", "caisson", "caissons", "subwoofer", "sub"]) {
        needs.insert(Need::ExtraBass);
    }
    if utterance.has_any_phrase(&["plus de voies", "12 voies", "douze voies", "plusieurs musiciens"]) {
        needs.insert(Need::MoreChannels);
    }
    if utterance.has_any_phrase(&["plus de puissance", "plus puissant", "plus fort", "grosse sono"]) {
        needs.insert(Need::MorePower);
    }
    if installation(utterance) == Some(true) {
        needs.insert(Need::Installation);
    }
    needs
}

const PEOPLE_NOUNS: &[&str] =
    &["personnes", "invites", "convives", "participants", "personne", "invite", "gens"];

/// Slots an assistant message is asking about.
pub fn asked_slots(utterance: &Utterance) -> BTreeSet<SlotKey> {
    let mut asked = BTreeSet::new();

    if utterance.has_any_phrase(&[
        "type d evenement",
        "ce que vous organisez",
        "quel evenement",
        "quelle occasion",
        "quel genre d evenement",
    ]) {
        asked.insert(SlotKey::EventType);
    }
    if (utterance.has_word("combien") && utterance.has_any_word(PEOPLE_NOUNS))
        || utterance.has_any_phrase(&["nombre de personnes", "nombre d invites", "nombre de convives"])
    {
        asked.insert(SlotKey::PeopleCount);
    }
    if utterance.has_word("interieur") && utterance.has_word("exterieur") {
        asked.insert(SlotKey::IndoorOutdoor);
    }
    if utterance.has_any_phrase(&["quelle ambiance", "type d ambiance", "quel style d ambiance"]) {
        asked.insert(SlotKey::Ambiance);
    }
    let end_date = utterance.has_any_phrase(&[
        "jusqu a quelle date",
        "date de fin",
        "date de retour",
        "combien de jours",
    ]);
    if end_date {
        asked.insert(SlotKey::EndDate);
    }
    if !end_date
        && utterance.has_any_phrase(&["quelle date", "quel jour", "date de votre evenement", "date de l evenement"])
    {
        asked.insert(SlotKey::StartDate);
    }
    let hour_question = utterance.has_phrase("quelle heure");
    if (hour_question && utterance.has_any_word(&["termine", "finit", "fin", "jusqu"]))
        || utterance.has_phrase("heure de fin")
    {
        asked.insert(SlotKey::EndTime);
    } else if (hour_question && utterance.has_any_word(&["commence", "debute", "debut"]))
        || utterance.has_phrase("heure de debut")
    {
        asked.insert(SlotKey::StartTime);
    }
    if utterance.has_word("livraison")
        && (utterance.has_word("retrait") || utterance.has_phrase("venir chercher"))
    {
        asked.insert(SlotKey::DeliveryChoice);
    }
    if utterance.has_any_phrase(&["code postal", "quelle adresse", "l adresse", "quelle ville", "quel departement"]) {
        asked.insert(SlotKey::Department);
    }
    asked
}

/// True when an assistant message asks the customer to confirm a summary.
pub fn seeks_confirmation(utterance: &Utterance) -> bool {
    utterance.has_any_phrase(&[
        "est ce correct",
        "est correct",
        "c est bien ca",
        "est ce bien ca",
        "vous confirmez",
        "confirmez vous",
        "je recapitule",
        "recapitulatif",
        "on valide",
        "ca vous convient",
    ])
}

const ACKNOWLEDGEMENT_PHRASES: &[&str] = &[
    "c est bien ca",
    "c est ca",
    "c est bon",
    "c est parfait",
    "c est correct",
    "c est valide",
    "tout est bon",
    "tout est correct",
    "tout a fait",
    "d accord",
    "ca marche",
    "ca me va",
    "je confirme",
    "je valide",
];
const ACKNOWLEDGEMENT_WORDS: &[&str] = &[
    "oui", "ok", "okay", "parfait", "exactement", "yes", "merci", "top", "super", "valide",
    "confirme", "bien", "absolument", "nickel", "carrement", "voila", "impeccable",
];
const ACKNOWLEDGEMENT_MAX_WORDS: usize = 6;

/// A short reply made only of acknowledgements (`oui`, `d'accord`,
/// `c'est ça`).
pub fn is_acknowledgement(utterance: &Utterance) -> bool {
    if utterance.is_empty() || utterance.words().len() > ACKNOWLEDGEMENT_MAX_WORDS {
        return false;
    }
    let mut rest = format!(" {} ", utterance.words().join(" "));
    for phrase in ACKNOWLEDGEMENT_PHRASES {
        rest = rest.replace(&format!(" {phrase} "), " ");
    }
    rest.split_whitespace().all(|word| ACKNOWLEDGEMENT_WORDS.contains(&word))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use soundrent_core::text::{fold, Utterance};
    use soundrent_core::{DeliveryChoice, Environment, EventKind, Need};

    use super::{
        address, asked_slots, dates, detect, is_acknowledgement, people_count, seeks_confirmation,
        stated_people_count, times, SlotKey,
    };

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).expect("valid date")
    }

    fn date(month: u32, day: u32, year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    fn dates_of(text: &str) -> (Option<NaiveDate>, Option<NaiveDate>) {
        dates(&fold(text), &Utterance::new(text), reference())
    }

    #[test]
    fn people_counts() {
        struct Case {
            text: &'static str,
            expected: Option<u32>,
        }
        let cases = [
            Case { text: "pour 50 personnes", expected: Some(50) },
            Case { text: "entre 80 et 100 invités", expected: Some(100) },
            Case { text: "80-100 personnes", expected: Some(100) },
            Case { text: "on sera une centaine", expected: Some(100) },
            Case { text: "deux centaines de convives", expected: Some(200) },
            Case { text: "le 12 juin, 150 pers", expected: Some(150) },
            Case { text: "le 12 juin", expected: None },
            Case { text: "prévu pour 2026", expected: None },
            Case { text: "Mariage le 13/06/2026, 120 personnes", expected: Some(120) },
            Case { text: "le 13 juin 2026 120 invités", expected: Some(120) },
        ];

        for (index, case) in cases.iter().enumerate() {
            assert_eq!(people_count(case.text), case.expected, "case {index}: {}", case.text);
        }
    }

    #[test]
    fn stated_headcount_ignores_capacity_ranges() {
        assert_eq!(stated_people_count("Pour vos 120 invités, je vous propose un pack L."), Some(120));
        assert_eq!(stated_people_count("Le Pack M convient de 50 à 100 personnes."), None);
        assert_eq!(stated_people_count("Pour une centaine de personnes"), None);
        assert_eq!(stated_people_count("Combien de personnes ?"), None);
    }

    #[test]
    fn numeric_and_textual_dates() {
        assert_eq!(dates_of("le 12/06"), (Some(date(6, 12, 2026)), None));
        assert_eq!(dates_of("le 12/06/2027"), (Some(date(6, 12, 2027)), None));
        assert_eq!(dates_of("le 3 mars"), (Some(date(3, 3, 2027)), None));
        assert_eq!(
            dates_of("du 12 au 14 juin"),
            (Some(date(6, 12, 2026)), Some(date(6, 14, 2026)))
        );
        assert_eq!(
            dates_of("du 12/06 au 13/06"),
            (Some(date(6, 12, 2026)), Some(date(6, 13, 2026)))
        );
    }

    #[test]
    fn relative_and_single_day_dates() {
        assert_eq!(dates_of("c'est demain"), (Some(date(5, 21, 2026)), None));
        assert_eq!(dates_of("après-demain"), (Some(date(5, 22, 2026)), None));
        // 2026-05-20 is a Wednesday.
        assert_eq!(dates_of("samedi"), (Some(date(5, 23, 2026)), None));
        assert_eq!(
            dates_of("le 12 juin, sur une journée"),
            (Some(date(6, 12, 2026)), Some(date(6, 12, 2026)))
        );
    }

    #[test]
    fn clock_times() {
        assert_eq!(times(&fold("à 18h")), (Some(time(18, 0)), None));
        assert_eq!(times(&fold("de 18h30 à 2h")), (Some(time(18, 30)), Some(time(2, 0))));
        assert_eq!(times(&fold("à 19:15 jusqu'à minuit")), (Some(time(19, 15)), Some(time(0, 0))));
        assert_eq!(times(&fold("jusqu'à 23h")), (None, Some(time(23, 0))));
        assert_eq!(times(&fold("ça commence dans 2 heures")), (None, None));
        assert_eq!(times(&fold("12 haut-parleurs")), (None, None));
    }

    #[test]
    fn location_details() {
        let mentions = detect("Livraison au 12 rue de la Paix, 75002 Paris", reference());
        assert_eq!(mentions.department.as_deref(), Some("75"));
        assert_eq!(mentions.delivery_choice, Some(DeliveryChoice::Delivery));
        assert_eq!(mentions.address.as_deref(), Some("12 rue de la Paix, 75002 Paris"));

        assert_eq!(detect("c'est à Versailles", reference()).department.as_deref(), Some("78"));
        assert_eq!(detect("ajaccio 20000", reference()).department.as_deref(), Some("2A"));
        assert_eq!(detect("département 92", reference()).department.as_deref(), Some("92"));
        assert_eq!(address("pas d'adresse ici"), None);
    }

    #[test]
    fn amounts_are_not_postal_codes() {
        assert_eq!(detect("Mariage, budget 15000 euros", reference()).department, None);
        assert_eq!(detect("un budget de 12000 pour la sono", reference()).department, None);
        assert_eq!(detect("jusqu'à 15000 € TTC", reference()).department, None);
        assert_eq!(detect("livraison à 92100", reference()).department.as_deref(), Some("92"));
    }

    #[test]
    fn event_facts() {
        let mentions = detect(
            "Mariage en extérieur pour 120 invités, avec micro sans fil, je viendrai chercher le matériel",
            reference(),
        );
        assert_eq!(mentions.event_type, Some(EventKind::Wedding));
        assert_eq!(mentions.environment, Some(Environment::Outdoor));
        assert_eq!(mentions.people_count, Some(120));
        assert!(mentions.needs.contains(&Need::WirelessMicrophone));
        assert!(!mentions.needs.contains(&Need::Microphone));
        assert_eq!(mentions.delivery_choice, Some(DeliveryChoice::Pickup));
    }

    #[test]
    fn installation_negation_wins() {
        assert_eq!(detect("pas besoin d'installation", reference()).with_installation, Some(false));
        assert_eq!(detect("avec installation svp", reference()).with_installation, Some(true));
        assert_eq!(detect("bonjour", reference()).with_installation, None);
    }

    #[test]
    fn question_fingerprints() {
        let asked = |text: &str| asked_slots(&Utterance::new(text));

        assert!(asked("Combien de personnes attendez-vous ?").contains(&SlotKey::PeopleCount));
        assert!(asked("En intérieur ou en extérieur ?").contains(&SlotKey::IndoorOutdoor));
        assert!(asked("À quelle date a lieu votre événement ?").contains(&SlotKey::StartDate));
        assert!(asked("Jusqu'à quelle date souhaitez-vous garder le matériel ?")
            .contains(&SlotKey::EndDate));
        assert!(!asked("Jusqu'à quelle date souhaitez-vous garder le matériel ?")
            .contains(&SlotKey::StartDate));
        assert!(asked("À quelle heure se termine l'événement ?").contains(&SlotKey::EndTime));
        assert!(asked("Préférez-vous la livraison ou le retrait ?").contains(&SlotKey::DeliveryChoice));
        assert!(asked("Combien de jours ?").iter().all(|slot| *slot != SlotKey::PeopleCount));
    }

    #[test]
    fn confirmation_and_acknowledgement() {
        assert!(seeks_confirmation(&Utterance::new("Pack M livré le 12 juin, c'est bien ça ?")));
        assert!(!seeks_confirmation(&Utterance::new("Combien de personnes ?")));

        for text in ["oui", "Oui, c'est ça !", "d'accord", "ok merci", "tout à fait", "Oui, je confirme"] {
            assert!(is_acknowledgement(&Utterance::new(text)), "{text}");
        }
        for text in ["", "oui mais pour 80 personnes", "non", "je ne sais pas", "c'est tout", "à Paris"] {
            assert!(!is_acknowledgement(&Utterance::new(text)), "{text}");
        }
    }
}
