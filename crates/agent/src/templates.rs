//! Canned French replies keyed by intent.

use crate::intent::Intent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateBook {
    contact_phone: String,
}

impl TemplateBook {
    pub fn new(contact_phone: impl Into<String>) -> Self {
        Self { contact_phone: contact_phone.into() }
    }

    pub fn contact_phone(&self) -> &str {
        &self.contact_phone
    }

    /// Sent once the customer has approved the draft summary.
    pub fn confirmed_reply(&self) -> String {
        format!(
            "Parfait, c'est noté ! Votre demande est validée : vous pouvez finaliser la réservation depuis votre panier. Pour toute question, notre équipe reste joignable au {}.",
            self.contact_phone
        )
    }

    /// Canned reply for `intent`, or `None` when the generator should answer.
    pub fn reply_for(&self, intent: Intent) -> Option<String> {
        let phone = &self.contact_phone;
        let reply = match intent {
            Intent::EquipmentFailure => format!(
                "Je suis désolé pour ce contretemps ! Pour une panne pendant votre événement, appelez directement notre équipe au {phone} : nous vous dépannons au plus vite."
            ),
            Intent::MissingPerformer => format!(
                "Pas de panique ! Nos packs se branchent en quelques minutes et diffusent une playlist sans DJ. Appelez-nous au {phone} pour une livraison express."
            ),
            Intent::LastMinuteAddition => format!(
                "C'est souvent possible ! Appelez-nous au {phone} pour vérifier la disponibilité immédiate du matériel à ajouter."
            ),
            Intent::ImminentEvent => format!(
                "Votre événement approche : pour une réservation de dernière minute, le plus rapide est de nous appeler au {phone}. Nous vérifions la disponibilité immédiatement."
            ),
            Intent::NoiseComplaint => format!(
                "Pour limiter les nuisances, baissez d'abord le caisson de basses et orientez les enceintes vers l'intérieur de la salle. Notre équipe reste joignable au {phone}."
            ),
            Intent::TechnicalMalfunction => format!(
                "Éloignez les micros des enceintes et baissez légèrement le volume général : cela règle la plupart des larsens. Si le problème persiste, appelez-nous au {phone}."
            ),
            Intent::Wedding => "Félicitations pour votre mariage ! Combien d'invités attendez-vous, et la réception aura-t-elle lieu en intérieur ou en extérieur ?".to_string(),
            Intent::BirthdaySmall => "Super, un anniversaire ! Jusqu'à 50 personnes, notre Pack S est souvent idéal. La fête aura-t-elle lieu en intérieur ou en extérieur ?".to_string(),
            Intent::BirthdayLarge => "Belle fête en perspective ! Au-delà de 50 invités, je vous oriente plutôt vers le Pack M ou le Pack L. La soirée aura-t-elle lieu en intérieur ou en extérieur ?".to_string(),
            Intent::CorporateParty => "Très bien pour votre événement d'entreprise ! Combien de participants attendez-vous ?".to_string(),
            Intent::PrivateParty => "Une soirée, avec plaisir ! Combien de personnes attendez-vous ?".to_string(),
            Intent::Conference => "Pour une conférence, la clarté des voix est essentielle : notre Pack Conférence inclut deux micros sans fil. Combien de participants prévoyez-vous ?".to_string(),
            Intent::Ceremony => "Pour une cérémonie, nous prévoyons toujours un micro pour les discours. Combien de personnes seront présentes ?".to_string(),
            Intent::VenueType => "Merci pour ces précisions sur le lieu ! Quel type d'événement organisez-vous ?".to_string(),
            Intent::OutdoorEvent => "En extérieur, le son se disperse davantage et je prévois un peu plus de puissance. Combien de personnes attendez-vous ?".to_string(),
            Intent::WirelessMicrophone => "Nos micros sans fil laissent toute liberté de mouvement et s'ajoutent à n'importe quel pack. Combien vous en faut-il ?".to_string(),
            Intent::ExtraBass => "Pour plus de basses, je peux ajouter un caisson de 18 pouces à votre pack.".to_string(),
            Intent::FullDjSetup => "Pour un set DJ, je vous propose une table de mixage 12 voies et des enceintes taillées pour la piste de danse. Combien de personnes attendez-vous ?".to_string(),
            Intent::Karaoke => "Bonne idée ! Notre kit karaoké s'ajoute à n'importe quel pack.".to_string(),
            Intent::Lighting => "Les Packs L et XL incluent déjà un jeu de lumières. Pour les autres packs, je peux l'ajouter en option.".to_string(),
            Intent::Installation => "Notre équipe peut livrer, installer et régler tout le matériel sur place. Je l'ajoute à votre proposition ?".to_string(),
            Intent::Greeting => "Bonjour ! Dites-moi ce que vous organisez : quel type d'événement et pour combien de personnes ?".to_string(),
            Intent::VagueHelp => "Je suis là pour vous aider ! Quel type d'événement organisez-vous ?".to_string(),
            Intent::HumanContact => format!(
                "Bien sûr ! Vous pouvez joindre un conseiller au {phone}, du lundi au samedi. Je reste aussi disponible ici si besoin."
            ),
            Intent::MultiRoom
            | Intent::PowerSupply
            | Intent::Discretion
            | Intent::VocalClarity
            | Intent::PackComparison
            | Intent::PowerWorry
            | Intent::BudgetConcern
            | Intent::QuoteRequest
            | Intent::Availability
            | Intent::Reassurance
            | Intent::PurchaseHesitation => return None,
        };
        Some(reply)
    }
}
