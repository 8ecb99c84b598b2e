//! Rule-based intent classification over normalized French utterances.
//!
//! Rules are independent predicates evaluated in priority order; the first
//! match wins. All keyword checks are whole-word or word-boundary phrase
//! matches, never raw substring containment.

use serde::{Deserialize, Serialize};
use soundrent_core::text::Utterance;

use crate::slots;

/// Vague help requests only count when the message is this short.
pub const VAGUE_HELP_MAX_CHARS: usize = 60;
/// Birthdays above this headcount use the large-birthday reply.
pub const SMALL_BIRTHDAY_MAX_GUESTS: u32 = 50;
const GREETING_MAX_WORDS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    Emergency,
    EventType,
    TechnicalNeed,
    Greeting,
    Commercial,
    HumanContact,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    EquipmentFailure,
    MissingPerformer,
    LastMinuteAddition,
    ImminentEvent,
    NoiseComplaint,
    TechnicalMalfunction,
    Wedding,
    BirthdaySmall,
    BirthdayLarge,
    CorporateParty,
    PrivateParty,
    Conference,
    Ceremony,
    VenueType,
    OutdoorEvent,
    WirelessMicrophone,
    ExtraBass,
    FullDjSetup,
    Karaoke,
    Lighting,
    Installation,
    MultiRoom,
    PowerSupply,
    Discretion,
    VocalClarity,
    Greeting,
    VagueHelp,
    PackComparison,
    PowerWorry,
    BudgetConcern,
    QuoteRequest,
    Availability,
    Reassurance,
    PurchaseHesitation,
    HumanContact,
}

impl Intent {
    pub fn tag(self) -> &'static str {
        match self {
            Self::EquipmentFailure => "urgence_panne",
            Self::MissingPerformer => "urgence_dj_absent",
            Self::LastMinuteAddition => "urgence_ajout_derniere_minute",
            Self::ImminentEvent => "urgence_evenement_imminent",
            Self::NoiseComplaint => "urgence_voisinage",
            Self::TechnicalMalfunction => "urgence_probleme_technique",
            Self::Wedding => "evenement_mariage",
            Self::BirthdaySmall => "evenement_anniversaire_petit",
            Self::BirthdayLarge => "evenement_anniversaire_grand",
            Self::CorporateParty => "evenement_entreprise",
            Self::PrivateParty => "evenement_soiree_privee",
            Self::Conference => "evenement_conference",
            Self::Ceremony => "evenement_ceremonie",
            Self::VenueType => "evenement_lieu",
            Self::OutdoorEvent => "evenement_exterieur",
            Self::WirelessMicrophone => "besoin_micro_sans_fil",
            Self::ExtraBass => "besoin_basses",
            Self::FullDjSetup => "besoin_dj",
            Self::Karaoke => "besoin_karaoke",
            Self::Lighting => "besoin_lumieres",
            Self::Installation => "besoin_installation",
            Self::MultiRoom => "besoin_multi_salles",
            Self::PowerSupply => "besoin_electricite",
            Self::Discretion => "besoin_discretion",
            Self::VocalClarity => "besoin_clarte_voix",
            Self::Greeting => "salutation",
            Self::VagueHelp => "aide_vague",
            Self::PackComparison => "comparaison_packs",
            Self::PowerWorry => "inquietude_puissance",
            Self::BudgetConcern => "budget",
            Self::QuoteRequest => "demande_devis",
            Self::Availability => "disponibilite",
            Self::Reassurance => "besoin_reassurance",
            Self::PurchaseHesitation => "hesitation_achat",
            Self::HumanContact => "contact_humain",
        }
    }

    pub fn category(self) -> IntentCategory {
        match self {
            Self::EquipmentFailure
            | Self::MissingPerformer
            | Self::LastMinuteAddition
            | Self::ImminentEvent
            | Self::NoiseComplaint
            | Self::TechnicalMalfunction => IntentCategory::Emergency,
            Self::Wedding
            | Self::BirthdaySmall
            | Self::BirthdayLarge
            | Self::CorporateParty
            | Self::PrivateParty
            | Self::Conference
            | Self::Ceremony
            | Self::VenueType
            | Self::OutdoorEvent => IntentCategory::EventType,
            Self::WirelessMicrophone
            | Self::ExtraBass
            | Self::FullDjSetup
            | Self::Karaoke
            | Self::Lighting
            | Self::Installation
            | Self::MultiRoom
            | Self::PowerSupply
            | Self::Discretion
            | Self::VocalClarity => IntentCategory::TechnicalNeed,
            Self::Greeting => IntentCategory::Greeting,
            Self::VagueHelp
            | Self::PackComparison
            | Self::PowerWorry
            | Self::BudgetConcern
            | Self::QuoteRequest
            | Self::Availability
            | Self::Reassurance
            | Self::PurchaseHesitation => IntentCategory::Commercial,
            Self::HumanContact => IntentCategory::HumanContact,
        }
    }

    pub fn is_emergency(self) -> bool {
        self.category() == IntentCategory::Emergency
    }
}

impl Serialize for Intent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

type Rule = (fn(&Utterance) -> bool, Intent);

/// Priority-ordered rule table. Birthdays are resolved separately because
/// their tag depends on the headcount.
static RULES: &[Rule] = &[
    (equipment_failure, Intent::EquipmentFailure),
    (missing_performer, Intent::MissingPerformer),
    (last_minute_addition, Intent::LastMinuteAddition),
    (imminent_event, Intent::ImminentEvent),
    (noise_complaint, Intent::NoiseComplaint),
    (technical_malfunction, Intent::TechnicalMalfunction),
    (wedding, Intent::Wedding),
    (birthday, Intent::BirthdaySmall),
    (corporate_party, Intent::CorporateParty),
    (private_party, Intent::PrivateParty),
    (conference, Intent::Conference),
    (ceremony, Intent::Ceremony),
    (venue_type, Intent::VenueType),
    (outdoor_event, Intent::OutdoorEvent),
    (wireless_microphone, Intent::WirelessMicrophone),
    (extra_bass, Intent::ExtraBass),
    (full_dj_setup, Intent::FullDjSetup),
    (karaoke, Intent::Karaoke),
    (lighting, Intent::Lighting),
    (installation, Intent::Installation),
    (multi_room, Intent::MultiRoom),
    (power_supply, Intent::PowerSupply),
    (discretion, Intent::Discretion),
    (vocal_clarity, Intent::VocalClarity),
    (greeting, Intent::Greeting),
    (vague_help, Intent::VagueHelp),
    (pack_comparison, Intent::PackComparison),
    (power_worry, Intent::PowerWorry),
    (budget_concern, Intent::BudgetConcern),
    (quote_request, Intent::QuoteRequest),
    (availability, Intent::Availability),
    (reassurance, Intent::Reassurance),
    (purchase_hesitation, Intent::PurchaseHesitation),
    (human_contact, Intent::HumanContact),
];

#[derive(Clone, Debug, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, raw: &str) -> Option<Intent> {
        classify(raw)
    }
}

/// First matching intent for `raw`, or `None`.
pub fn classify(raw: &str) -> Option<Intent> {
    let utterance = Utterance::new(raw);
    if utterance.is_empty() {
        return None;
    }

    let (_, intent) = RULES.iter().find(|(predicate, _)| predicate(&utterance))?;
    match intent {
        Intent::BirthdaySmall => Some(birthday_by_size(raw)),
        other => Some(*other),
    }
}

fn birthday_by_size(raw: &str) -> Intent {
    match slots::people_count(raw) {
        Some(count) if count > SMALL_BIRTHDAY_MAX_GUESTS => Intent::BirthdayLarge,
        _ => Intent::BirthdaySmall,
    }
}

const IMMINENT_PHRASES: &[&str] = &[
    "ce soir",
    "aujourd hui",
    "dans une heure",
    "dans deux heures",
    "dans 1 heure",
    "dans 2 heures",
    "dans 1h",
    "dans 2h",
    "dans une demi heure",
    "tout de suite",
    "au plus vite",
    "en urgence",
];

fn equipment_failure(u: &Utterance) -> bool {
    u.has_any_phrase(&[
        "en panne",
        "ne marche plus",
        "ne fonctionne plus",
        "marche pas",
        "fonctionne pas",
        "plus de son",
        "ne s allume plus",
        "ne s allume pas",
    ]) || u.has_any_word(&["panne", "casse", "cassee", "grille", "grillee", "hs"])
}

fn missing_performer(u: &Utterance) -> bool {
    let performer = u.has_any_word(&["dj", "animateur", "chanteur", "chanteuse", "musicien", "musiciens"]);
    let missing = u.has_any_word(&["annule", "annulation", "absent", "desiste", "malade", "lache"])
        || u.has_any_phrase(&["pas venu", "ne viendra pas", "ne vient pas", "pas la", "nous a lache"]);
    performer && missing
}

fn last_minute_addition(u: &Utterance) -> bool {
    u.has_any_phrase(&["derniere minute", "au dernier moment"])
        || (u.has_any_word(&["ajouter", "rajouter", "ajout", "rajout"]) && u.has_any_phrase(IMMINENT_PHRASES))
}

fn imminent_event(u: &Utterance) -> bool {
    u.has_any_phrase(IMMINENT_PHRASES) || u.has_any_word(&["urgent", "urgente", "urgence", "asap"])
}

fn noise_complaint(u: &Utterance) -> bool {
    u.has_any_word(&["voisin", "voisins", "voisinage", "tapage", "plainte", "police", "gendarmes"])
        || u.has_phrase("trop fort")
}

fn technical_malfunction(u: &Utterance) -> bool {
    u.has_any_word(&[
        "larsen",
        "gresille",
        "gresillent",
        "gresillement",
        "sature",
        "saturation",
        "siffle",
        "coupe",
        "coupure",
        "parasite",
        "parasites",
        "bourdonnement",
    ])
}

fn wedding(u: &Utterance) -> bool {
    u.has_any_word(&["mariage", "mariages", "noces", "mariee", "maries", "pacs"])
}

fn birthday(u: &Utterance) -> bool {
    u.has_any_word(&["anniversaire", "anniversaires", "anniv"])
}

fn corporate_party(u: &Utterance) -> bool {
    u.has_any_phrase(&[
        "soiree d entreprise",
        "fete d entreprise",
        "evenement d entreprise",
        "repas d entreprise",
        "team building",
    ]) || u.has_any_word(&["entreprise", "afterwork", "cse", "corporate", "societe", "collegues", "salaries"])
}

fn private_party(u: &Utterance) -> bool {
    u.has_any_phrase(&["soiree privee", "fete privee", "fete de famille", "fete entre amis"])
        || u.has_any_word(&["soiree", "fete", "teuf", "cremaillere", "party"])
}

fn conference(u: &Utterance) -> bool {
    u.has_any_word(&[
        "conference",
        "conferences",
        "seminaire",
        "seminaires",
        "colloque",
        "congres",
        "assemblee",
        "reunion",
        "presentation",
    ]) || u.has_phrase("table ronde")
}

fn ceremony(u: &Utterance) -> bool {
    u.has_any_word(&[
        "ceremonie",
        "bapteme",
        "communion",
        "circoncision",
        "obseques",
        "enterrement",
        "funerailles",
        "eglise",
        "mosquee",
        "synagogue",
        "henne",
    ]) || u.has_any_phrase(&["bar mitzvah", "bat mitzvah", "vin d honneur"])
}

fn venue_type(u: &Utterance) -> bool {
    u.has_any_phrase(&["salle des fetes", "salle de reception", "salle polyvalente"])
        || u.has_any_word(&["chateau", "domaine", "peniche", "gymnase", "restaurant", "guinguette", "grange", "loft", "rooftop"])
}

fn outdoor_event(u: &Utterance) -> bool {
    u.has_any_word(&["exterieur", "dehors", "jardin", "terrasse", "plage", "parc", "camping"])
        || u.has_phrase("plein air")
}

fn wireless_microphone(u: &Utterance) -> bool {
    u.has_any_phrase(&[
        "micro sans fil",
        "micros sans fil",
        "micro hf",
        "micros hf",
        "micro cravate",
        "micro serre tete",
    ])
}

fn extra_bass(u: &Utterance) -> bool {
    u.has_any_word(&["basses", "basse", "caisson", "caissons", "subwoofer", "subwoofers", "sub"])
}

fn full_dj_setup(u: &Utterance) -> bool {
    u.has_any_word(&["dj", "platine", "platines", "controleur", "mix"])
}

fn karaoke(u: &Utterance) -> bool {
    u.has_word("karaoke")
}

fn lighting(u: &Utterance) -> bool {
    u.has_any_word(&[
        "lumiere",
        "lumieres",
        "eclairage",
        "eclairages",
        "projecteur",
        "projecteurs",
        "laser",
        "lasers",
        "stroboscope",
        "spots",
    ]) || u.has_phrase("effets lumineux")
}

fn installation(u: &Utterance) -> bool {
    u.has_any_word(&["installation", "installer", "montage", "technicien"]) || u.has_phrase("mise en place")
}

fn multi_room(u: &Utterance) -> bool {
    u.has_any_phrase(&[
        "plusieurs salles",
        "deux salles",
        "2 salles",
        "trois salles",
        "plusieurs pieces",
        "autre salle",
        "multi salles",
        "plusieurs espaces",
        "deux espaces",
    ])
}

fn power_supply(u: &Utterance) -> bool {
    u.has_any_word(&["electricite", "electrique", "alimentation", "rallonge", "rallonges"])
        || u.has_any_phrase(&[
            "groupe electrogene",
            "prise electrique",
            "prises electriques",
            "courant electrique",
            "une prise",
            "des prises",
            "assez de prises",
        ])
}

fn discretion(u: &Utterance) -> bool {
    u.has_any_word(&["discret", "discrete", "discrets", "discretes", "discretion", "invisible", "esthetique", "sobre"])
        || u.has_any_phrase(&["pas trop visible", "pas trop voyant"])
}

fn vocal_clarity(u: &Utterance) -> bool {
    u.has_any_word(&["clarte", "intelligible", "audible", "audibles"])
        || u.has_any_phrase(&[
            "bien entendre",
            "qu on entende",
            "entende bien",
            "voix claire",
            "les discours",
            "prise de parole",
            "prises de parole",
        ])
}

fn greeting(u: &Utterance) -> bool {
    const GREETINGS: &[&str] =
        &["bonjour", "bonsoir", "salut", "hello", "coucou", "hey", "bjr", "slt", "yo", "hi"];
    u.words().len() <= GREETING_MAX_WORDS
        && u.words().first().is_some_and(|word| GREETINGS.contains(&word.as_str()))
}

fn vague_help(u: &Utterance) -> bool {
    if u.len() >= VAGUE_HELP_MAX_CHARS {
        return false;
    }
    u.has_any_phrase(&[
        "besoin d aide",
        "aidez moi",
        "aide moi",
        "m aider",
        "je ne sais pas",
        "sais pas quoi",
        "je cherche une sono",
        "besoin d une sono",
        "besoin de son",
        "que me conseillez",
        "vous me conseillez",
        "un conseil",
        "des conseils",
        "je n y connais rien",
    ]) || u.has_any_word(&["aide", "aider", "help"])
}

fn pack_comparison(u: &Utterance) -> bool {
    u.has_any_phrase(&[
        "quel pack",
        "quelle formule",
        "difference entre",
        "quelle difference",
        "lequel choisir",
        "lequel prendre",
    ]) || u.has_any_word(&["comparer", "comparaison", "compare"])
}

fn power_worry(u: &Utterance) -> bool {
    u.has_any_phrase(&[
        "assez puissant",
        "assez puissante",
        "assez fort",
        "suffisamment puissant",
        "assez de puissance",
        "assez de son",
        "trop juste",
    ]) || u.has_any_word(&["suffira", "suffisant", "suffisante", "suffire"])
}

fn budget_concern(u: &Utterance) -> bool {
    u.has_any_word(&["budget", "cher", "chere", "couteux", "economique", "reduction", "remise", "promo", "promotion"])
}

fn quote_request(u: &Utterance) -> bool {
    u.has_any_word(&["devis", "tarif", "tarifs", "prix", "cout", "coute", "estimation"])
        || u.has_phrase("combien pour")
}

fn availability(u: &Utterance) -> bool {
    u.has_any_word(&[
        "disponible",
        "disponibles",
        "dispo",
        "dispos",
        "disponibilite",
        "disponibilites",
        "stock",
        "reserver",
        "reservation",
        "libre",
    ])
}

fn reassurance(u: &Utterance) -> bool {
    u.has_any_word(&["fiable", "fiables", "garantie", "garanti", "confiance", "rassurer", "rassure", "serieux", "avis"])
        || u.has_any_phrase(&["vous etes sur", "vous etes surs", "ca va bien marcher"])
}

fn purchase_hesitation(u: &Utterance) -> bool {
    u.has_any_word(&["hesite", "hesitation", "hesitons", "reflechir", "reflechis"])
        || u.has_any_phrase(&["pas sur", "pas encore decide", "pas certain", "pas convaincu", "je vais voir"])
}

fn human_contact(u: &Utterance) -> bool {
    u.has_any_phrase(&[
        "parler a",
        "parler avec",
        "parler au",
        "parler aux",
        "je veux parler",
        "je peux parler",
        "je voudrais parler",
        "j aimerais parler",
        "un humain",
        "une humaine",
        "un conseiller",
        "une conseillere",
        "une vraie personne",
        "une personne reelle",
        "coup de fil",
        "etre rappele",
    ]) || u.has_any_word(&[
        "humain",
        "humaine",
        "conseiller",
        "conseillere",
        "telephone",
        "appeler",
        "rappeler",
        "appelez",
        "rappelez",
        "joindre",
    ])
}

#[cfg(test)]
mod tests {
    use super::{classify, Intent, IntentCategory};

    #[test]
    fn people_counts_never_read_as_human_contact() {
        for text in ["pour 50 personnes", "100 personnes", "On sera 80 personnes", "une personne"] {
            assert_ne!(classify(text), Some(Intent::HumanContact), "{text}");
        }
    }

    #[test]
    fn human_contact_phrasings() {
        for text in [
            "je veux parler à quelqu'un",
            "un conseiller",
            "téléphone",
            "Je voudrais parler avec une vraie personne",
            "Vous pouvez me rappeler ?",
        ] {
            assert_eq!(classify(text), Some(Intent::HumanContact), "{text}");
        }
    }

    #[test]
    fn keywords_inside_longer_words_do_not_match() {
        assert_ne!(classify("mon numéro téléphonique est sur le site"), Some(Intent::HumanContact));
        assert_ne!(classify("les humanités"), Some(Intent::HumanContact));
    }

    #[test]
    fn emergencies_outrank_everything() {
        assert_eq!(classify("Mariage ce soir et la sono est en panne !"), Some(Intent::EquipmentFailure));
        assert_eq!(classify("Notre DJ a annulé, le mariage est samedi"), Some(Intent::MissingPerformer));
        assert_eq!(
            classify("Je peux rajouter un micro pour ce soir ?"),
            Some(Intent::LastMinuteAddition)
        );
        assert_eq!(classify("les voisins se plaignent"), Some(Intent::NoiseComplaint));
        assert_eq!(classify("le micro fait du larsen"), Some(Intent::TechnicalMalfunction));
        assert!(classify("c'est urgent").is_some_and(Intent::is_emergency));
    }

    #[test]
    fn birthday_tag_depends_on_headcount() {
        assert_eq!(classify("un anniversaire pour 30 personnes"), Some(Intent::BirthdaySmall));
        assert_eq!(classify("anniversaire de 120 invités"), Some(Intent::BirthdayLarge));
        assert_eq!(classify("c'est pour un anniversaire"), Some(Intent::BirthdaySmall));
    }

    #[test]
    fn event_and_need_categories() {
        let cases = [
            ("On organise notre mariage", IntentCategory::EventType),
            ("une soirée d'entreprise", IntentCategory::EventType),
            ("un séminaire avec prise de parole", IntentCategory::EventType),
            ("dans notre jardin", IntentCategory::EventType),
            ("il me faut des micros sans fil", IntentCategory::TechnicalNeed),
            ("vous avez un kit karaoké ?", IntentCategory::TechnicalNeed),
            ("il faudrait plus de basses", IntentCategory::TechnicalNeed),
            ("Bonjour", IntentCategory::Greeting),
            ("Quel pack choisir ?", IntentCategory::Commercial),
            ("c'est trop cher pour nous", IntentCategory::Commercial),
            ("je voudrais un devis", IntentCategory::Commercial),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(text).map(Intent::category), Some(expected), "{text}");
        }
    }

    #[test]
    fn greeting_requires_a_short_message() {
        assert_eq!(classify("Salut !"), Some(Intent::Greeting));
        assert_ne!(
            classify("Bonjour je voudrais un devis pour une sono"),
            Some(Intent::Greeting)
        );
    }

    #[test]
    fn vague_help_only_for_short_messages() {
        assert_eq!(classify("j'ai besoin d'aide"), Some(Intent::VagueHelp));
        let long = "j'ai besoin d'aide mais je vais d'abord vous expliquer tout le contexte en détail";
        assert_ne!(classify(long), Some(Intent::VagueHelp));
    }

    #[test]
    fn unmatched_text_has_no_intent() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
        assert_eq!(classify("12/06/2026"), None);
    }

    #[test]
    fn tags_are_stable_snake_case() {
        assert_eq!(Intent::HumanContact.tag(), "contact_humain");
        assert_eq!(
            serde_json::to_string(&Intent::BirthdayLarge).ok().as_deref(),
            Some("\"evenement_anniversaire_grand\"")
        );
    }
}
