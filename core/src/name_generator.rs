//! Deterministic person names.
//!
//! Seeded people get a given name matching their sex and a random family
//! name. Newborns take a given name and inherit the family name of the
//! parent passed in. Same RNG stream = same names.

use crate::{person::Sex, rng::SlotRng};

const GIVEN_FEMALE: &[&str] = &[
    "Ada", "Aiko", "Amara", "Astrid", "Beatriz", "Bronwen", "Camille", "Chiara",
    "Dalia", "Delphine", "Ebele", "Elif", "Esme", "Farah", "Freya", "Greta",
    "Hana", "Ines", "Ingrid", "Isla", "Jun", "Kalinda", "Keziah", "Leila",
    "Liesel", "Lucia", "Maeve", "Malia", "Marisol", "Nadia", "Nia", "Noor",
    "Oona", "Orla", "Paloma", "Priya", "Rosalind", "Rumi", "Saoirse", "Selma",
    "Sunniva", "Tamsin", "Thandiwe", "Ulla", "Vesna", "Wren", "Yara", "Zofia",
];

const GIVEN_MALE: &[&str] = &[
    "Abel", "Aksel", "Anselm", "Arjun", "Bastian", "Bram", "Caspian", "Cormac",
    "Dario", "Desmond", "Emeka", "Emil", "Ezra", "Fintan", "Florin", "Gideon",
    "Hamza", "Hugo", "Idris", "Ivo", "Jarrah", "Joaquin", "Kenji", "Kofi",
    "Lars", "Leander", "Luca", "Malik", "Matteo", "Niall", "Nikolai", "Oisin",
    "Omar", "Pascal", "Quentin", "Rafael", "Rohan", "Santiago", "Silas", "Soren",
    "Tariq", "Teodor", "Tobiah", "Ulrich", "Vikram", "Wendell", "Yusuf", "Zoltan",
];

const FAMILY: &[&str] = &[
    "Abernathy", "Achterberg", "Adeyemi", "Almeida", "Ashdown", "Bakshi", "Balogun",
    "Berggren", "Blackwood", "Bragg", "Castellano", "Chowdhury", "Cienfuegos",
    "Dalgaard", "Delacroix", "Drummond", "Eastwick", "Ekwueme", "Falconer", "Fairweather",
    "Galloway", "Guerrero", "Halloran", "Haverford", "Hollis", "Ibarra", "Iwasaki",
    "Jablonski", "Juniper", "Kavanagh", "Kowalczyk", "Kuroda", "Lindqvist", "Lockhart",
    "Madsen", "Mbeki", "Moncrieff", "Nakashima", "Northcott", "Nyberg", "Okonjo",
    "Oyelaran", "Pemberton", "Petrakis", "Quennell", "Radcliffe", "Ravensworth",
    "Rosenthal", "Saltonstall", "Sandoval", "Szabo", "Tanaka", "Thistlewood",
    "Trevelyan", "Underhill", "Valdivia", "Vasiliou", "Wainwright", "Whitlock",
    "Yamamoto", "Yardley", "Zielinski",
];

pub struct NameGenerator;

impl NameGenerator {
    /// Given name plus a random family name.
    pub fn generate_full_name(sex: Sex, rng: &mut SlotRng) -> String {
        let given = Self::generate_first_name(sex, rng);
        format!("{given} {}", Self::generate_last_name(rng))
    }

    /// Given name plus an inherited family name.
    pub fn generate_child_name(sex: Sex, family_name: &str, rng: &mut SlotRng) -> String {
        format!("{} {family_name}", Self::generate_first_name(sex, rng))
    }

    pub fn generate_first_name(sex: Sex, rng: &mut SlotRng) -> &'static str {
        let pool = match sex {
            Sex::Female => GIVEN_FEMALE,
            Sex::Male   => GIVEN_MALE,
        };
        rng.pick(pool).copied().unwrap_or("Unnamed")
    }

    pub fn generate_last_name(rng: &mut SlotRng) -> &'static str {
        rng.pick(FAMILY).copied().unwrap_or("Unknown")
    }

    /// The family name part of a full name.
    pub fn family_name(full_name: &str) -> &str {
        full_name.rsplit(' ').next().unwrap_or(full_name)
    }
}
