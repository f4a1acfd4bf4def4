//! Provinces, powers, and coasts of the standard Diplomacy map.
//!
//! All 75 provinces are enumerated in alphabetical order by their stable
//! 3-letter identifier. Per-province metadata (display name, terrain kind,
//! supply-center flag, home power, named coasts) lives in a compile-time
//! table indexed by the `Province` enum discriminant.

use serde::{Deserialize, Serialize};

/// The number of provinces on the standard map.
pub const PROVINCE_COUNT: usize = 75;

/// The number of supply centers on the standard map.
pub const SUPPLY_CENTER_COUNT: usize = 34;

/// The number of home supply centers across all powers (3 each, 4 for Russia).
pub const HOME_CENTER_COUNT: usize = 22;

/// A province on the standard map, identified by its 3-letter id.
///
/// Variants are alphabetical by id. `#[repr(u8)]` lets the discriminant
/// index fixed-size lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Province {
    Adr = 0,  // Adriatic Sea
    Aeg = 1,  // Aegean Sea
    Alb = 2,  // Albania
    Ank = 3,  // Ankara
    Apu = 4,  // Apulia
    Arm = 5,  // Armenia
    Bal = 6,  // Baltic Sea
    Bar = 7,  // Barents Sea
    Bel = 8,  // Belgium
    Ber = 9,  // Berlin
    Bla = 10, // Black Sea
    Boh = 11, // Bohemia
    Bot = 12, // Gulf of Bothnia
    Bre = 13, // Brest
    Bud = 14, // Budapest
    Bul = 15, // Bulgaria
    Bur = 16, // Burgundy
    Cly = 17, // Clyde
    Con = 18, // Constantinople
    Den = 19, // Denmark
    Eas = 20, // Eastern Mediterranean
    Edi = 21, // Edinburgh
    Eng = 22, // English Channel
    Fin = 23, // Finland
    Gal = 24, // Galicia
    Gas = 25, // Gascony
    Gol = 26, // Gulf of Lyon
    Gre = 27, // Greece
    Hel = 28, // Heligoland Bight
    Hol = 29, // Holland
    Ion = 30, // Ionian Sea
    Iri = 31, // Irish Sea
    Kie = 32, // Kiel
    Lon = 33, // London
    Lvn = 34, // Livonia
    Lvp = 35, // Liverpool
    Mao = 36, // Mid-Atlantic Ocean
    Mar = 37, // Marseilles
    Mos = 38, // Moscow
    Mun = 39, // Munich
    Naf = 40, // North Africa
    Nao = 41, // North Atlantic Ocean
    Nap = 42, // Naples
    Nrg = 43, // Norwegian Sea
    Nth = 44, // North Sea
    Nwy = 45, // Norway
    Par = 46, // Paris
    Pic = 47, // Picardy
    Pie = 48, // Piedmont
    Por = 49, // Portugal
    Pru = 50, // Prussia
    Rom = 51, // Rome
    Ruh = 52, // Ruhr
    Rum = 53, // Rumania
    Ser = 54, // Serbia
    Sev = 55, // Sevastopol
    Sil = 56, // Silesia
    Ska = 57, // Skagerrak
    Smy = 58, // Smyrna
    Spa = 59, // Spain
    Stp = 60, // St. Petersburg
    Swe = 61, // Sweden
    Syr = 62, // Syria
    Tri = 63, // Trieste
    Tun = 64, // Tunisia
    Tus = 65, // Tuscany
    Tyr = 66, // Tyrolia
    Tys = 67, // Tyrrhenian Sea
    Ukr = 68, // Ukraine
    Ven = 69, // Venice
    Vie = 70, // Vienna
    Wal = 71, // Wales
    War = 72, // Warsaw
    Wes = 73, // Western Mediterranean
    Yor = 74, // Yorkshire
}

/// Every province, in discriminant order.
pub const ALL_PROVINCES: [Province; PROVINCE_COUNT] = [
    Province::Adr, Province::Aeg, Province::Alb, Province::Ank,
    Province::Apu, Province::Arm, Province::Bal, Province::Bar,
    Province::Bel, Province::Ber, Province::Bla, Province::Boh,
    Province::Bot, Province::Bre, Province::Bud, Province::Bul,
    Province::Bur, Province::Cly, Province::Con, Province::Den,
    Province::Eas, Province::Edi, Province::Eng, Province::Fin,
    Province::Gal, Province::Gas, Province::Gol, Province::Gre,
    Province::Hel, Province::Hol, Province::Ion, Province::Iri,
    Province::Kie, Province::Lon, Province::Lvn, Province::Lvp,
    Province::Mao, Province::Mar, Province::Mos, Province::Mun,
    Province::Naf, Province::Nao, Province::Nap, Province::Nrg,
    Province::Nth, Province::Nwy, Province::Par, Province::Pic,
    Province::Pie, Province::Por, Province::Pru, Province::Rom,
    Province::Ruh, Province::Rum, Province::Ser, Province::Sev,
    Province::Sil, Province::Ska, Province::Smy, Province::Spa,
    Province::Stp, Province::Swe, Province::Syr, Province::Tri,
    Province::Tun, Province::Tus, Province::Tyr, Province::Tys,
    Province::Ukr, Province::Ven, Province::Vie, Province::Wal,
    Province::War, Province::Wes, Province::Yor,
];

/// Terrain classification of a province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Land,
    Sea,
    Coastal,
}

/// A named coast of a multi-coast province.
///
/// Only `North`, `South`, and `East` occur on the standard map (STP and SPA
/// split north/south, BUL splits east/south); `West` exists for notation
/// completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Coast {
    North,
    South,
    East,
    West,
}

impl Coast {
    /// The two-letter notation suffix, e.g. `NC` for the north coast.
    pub const fn notation(self) -> &'static str {
        match self {
            Coast::North => "NC",
            Coast::South => "SC",
            Coast::East => "EC",
            Coast::West => "WC",
        }
    }

    /// Parses a coast from notation such as `NC`, `(sc)`, or `south coast`.
    pub fn parse(s: &str) -> Option<Coast> {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();
        match cleaned.as_str() {
            "NC" | "NORTH" | "NORTHCOAST" => Some(Coast::North),
            "SC" | "SOUTH" | "SOUTHCOAST" => Some(Coast::South),
            "EC" | "EAST" | "EASTCOAST" => Some(Coast::East),
            "WC" | "WEST" | "WESTCOAST" => Some(Coast::West),
            _ => None,
        }
    }
}

impl std::fmt::Display for Coast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.notation())
    }
}

/// One of the seven great powers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Power {
    England,
    France,
    Germany,
    Italy,
    Austria,
    Russia,
    Turkey,
}

/// All seven powers.
pub const ALL_POWERS: [Power; 7] = [
    Power::England,
    Power::France,
    Power::Germany,
    Power::Italy,
    Power::Austria,
    Power::Russia,
    Power::Turkey,
];

impl Power {
    /// Display name, capitalized.
    pub const fn name(self) -> &'static str {
        match self {
            Power::England => "England",
            Power::France => "France",
            Power::Germany => "Germany",
            Power::Italy => "Italy",
            Power::Austria => "Austria",
            Power::Russia => "Russia",
            Power::Turkey => "Turkey",
        }
    }

    /// Parses a power name, case-insensitively. Accepts a few common
    /// long forms ("austria-hungary", "great britain").
    pub fn parse(s: &str) -> Option<Power> {
        match s.trim().to_ascii_lowercase().as_str() {
            "england" | "great britain" | "britain" | "uk" => Some(Power::England),
            "france" => Some(Power::France),
            "germany" => Some(Power::Germany),
            "italy" => Some(Power::Italy),
            "austria" | "austria-hungary" | "austria hungary" => Some(Power::Austria),
            "russia" => Some(Power::Russia),
            "turkey" | "ottoman empire" | "ottomans" => Some(Power::Turkey),
            _ => None,
        }
    }

    /// Index into power-ordered arrays.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Power {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Static per-province metadata.
pub struct ProvinceData {
    pub id: &'static str,
    pub name: &'static str,
    pub terrain: Terrain,
    pub supply_center: bool,
    pub home_of: Option<Power>,
    pub coasts: &'static [Coast],
}

impl Province {
    /// The stable uppercase 3-letter identifier, e.g. `PAR`.
    pub const fn id(self) -> &'static str {
        PROVINCE_TABLE[self as usize].id
    }

    /// The human-readable name, e.g. "Paris".
    pub const fn name(self) -> &'static str {
        PROVINCE_TABLE[self as usize].name
    }

    pub const fn terrain(self) -> Terrain {
        PROVINCE_TABLE[self as usize].terrain
    }

    pub const fn is_sea(self) -> bool {
        matches!(self.terrain(), Terrain::Sea)
    }

    pub const fn is_land(self) -> bool {
        matches!(self.terrain(), Terrain::Land)
    }

    pub const fn is_coastal(self) -> bool {
        matches!(self.terrain(), Terrain::Coastal)
    }

    pub const fn is_supply_center(self) -> bool {
        PROVINCE_TABLE[self as usize].supply_center
    }

    /// The power whose home center this is, if any.
    pub const fn home_of(self) -> Option<Power> {
        PROVINCE_TABLE[self as usize].home_of
    }

    /// The named coasts of a multi-coast province; empty for everything else.
    pub const fn coasts(self) -> &'static [Coast] {
        PROVINCE_TABLE[self as usize].coasts
    }

    pub const fn has_multiple_coasts(self) -> bool {
        !PROVINCE_TABLE[self as usize].coasts.is_empty()
    }

    /// Looks up a province by exact uppercase 3-letter id.
    pub fn from_id(id: &str) -> Option<Province> {
        ALL_PROVINCES.iter().copied().find(|p| p.id() == id)
    }

    /// Converts a raw discriminant back to a province.
    pub fn from_index(idx: u8) -> Option<Province> {
        ALL_PROVINCES.get(idx as usize).copied()
    }
}

impl std::fmt::Display for Province {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

const NO_COASTS: &[Coast] = &[];
const NORTH_SOUTH: &[Coast] = &[Coast::North, Coast::South];
const EAST_SOUTH: &[Coast] = &[Coast::East, Coast::South];

const fn sea(id: &'static str, name: &'static str) -> ProvinceData {
    ProvinceData { id, name, terrain: Terrain::Sea, supply_center: false, home_of: None, coasts: NO_COASTS }
}

const fn land(id: &'static str, name: &'static str, sc: bool, home: Option<Power>) -> ProvinceData {
    ProvinceData { id, name, terrain: Terrain::Land, supply_center: sc, home_of: home, coasts: NO_COASTS }
}

const fn coastal(id: &'static str, name: &'static str, sc: bool, home: Option<Power>) -> ProvinceData {
    ProvinceData { id, name, terrain: Terrain::Coastal, supply_center: sc, home_of: home, coasts: NO_COASTS }
}

const fn split(
    id: &'static str,
    name: &'static str,
    home: Option<Power>,
    coasts: &'static [Coast],
) -> ProvinceData {
    ProvinceData { id, name, terrain: Terrain::Coastal, supply_center: true, home_of: home, coasts }
}

/// Compile-time metadata table, indexed by `Province as usize`.
pub static PROVINCE_TABLE: [ProvinceData; PROVINCE_COUNT] = [
    sea("ADR", "Adriatic Sea"),
    sea("AEG", "Aegean Sea"),
    coastal("ALB", "Albania", false, None),
    coastal("ANK", "Ankara", true, Some(Power::Turkey)),
    coastal("APU", "Apulia", false, None),
    coastal("ARM", "Armenia", false, None),
    sea("BAL", "Baltic Sea"),
    sea("BAR", "Barents Sea"),
    coastal("BEL", "Belgium", true, None),
    coastal("BER", "Berlin", true, Some(Power::Germany)),
    sea("BLA", "Black Sea"),
    land("BOH", "Bohemia", false, None),
    sea("BOT", "Gulf of Bothnia"),
    coastal("BRE", "Brest", true, Some(Power::France)),
    land("BUD", "Budapest", true, Some(Power::Austria)),
    split("BUL", "Bulgaria", None, EAST_SOUTH),
    land("BUR", "Burgundy", false, None),
    coastal("CLY", "Clyde", false, None),
    coastal("CON", "Constantinople", true, Some(Power::Turkey)),
    coastal("DEN", "Denmark", true, None),
    sea("EAS", "Eastern Mediterranean"),
    coastal("EDI", "Edinburgh", true, Some(Power::England)),
    sea("ENG", "English Channel"),
    coastal("FIN", "Finland", false, None),
    land("GAL", "Galicia", false, None),
    coastal("GAS", "Gascony", false, None),
    sea("GOL", "Gulf of Lyon"),
    coastal("GRE", "Greece", true, None),
    sea("HEL", "Heligoland Bight"),
    coastal("HOL", "Holland", true, None),
    sea("ION", "Ionian Sea"),
    sea("IRI", "Irish Sea"),
    coastal("KIE", "Kiel", true, Some(Power::Germany)),
    coastal("LON", "London", true, Some(Power::England)),
    coastal("LVN", "Livonia", false, None),
    coastal("LVP", "Liverpool", true, Some(Power::England)),
    sea("MAO", "Mid-Atlantic Ocean"),
    coastal("MAR", "Marseilles", true, Some(Power::France)),
    land("MOS", "Moscow", true, Some(Power::Russia)),
    land("MUN", "Munich", true, Some(Power::Germany)),
    coastal("NAF", "North Africa", false, None),
    sea("NAO", "North Atlantic Ocean"),
    coastal("NAP", "Naples", true, Some(Power::Italy)),
    sea("NRG", "Norwegian Sea"),
    sea("NTH", "North Sea"),
    coastal("NWY", "Norway", true, None),
    land("PAR", "Paris", true, Some(Power::France)),
    coastal("PIC", "Picardy", false, None),
    coastal("PIE", "Piedmont", false, None),
    coastal("POR", "Portugal", true, None),
    coastal("PRU", "Prussia", false, None),
    coastal("ROM", "Rome", true, Some(Power::Italy)),
    land("RUH", "Ruhr", false, None),
    coastal("RUM", "Rumania", true, None),
    land("SER", "Serbia", true, None),
    coastal("SEV", "Sevastopol", true, Some(Power::Russia)),
    land("SIL", "Silesia", false, None),
    sea("SKA", "Skagerrak"),
    coastal("SMY", "Smyrna", true, Some(Power::Turkey)),
    split("SPA", "Spain", None, NORTH_SOUTH),
    split("STP", "St. Petersburg", Some(Power::Russia), NORTH_SOUTH),
    coastal("SWE", "Sweden", true, None),
    coastal("SYR", "Syria", false, None),
    coastal("TRI", "Trieste", true, Some(Power::Austria)),
    coastal("TUN", "Tunisia", true, None),
    coastal("TUS", "Tuscany", false, None),
    land("TYR", "Tyrolia", false, None),
    sea("TYS", "Tyrrhenian Sea"),
    land("UKR", "Ukraine", false, None),
    coastal("VEN", "Venice", true, Some(Power::Italy)),
    land("VIE", "Vienna", true, Some(Power::Austria)),
    coastal("WAL", "Wales", false, None),
    land("WAR", "Warsaw", true, Some(Power::Russia)),
    sea("WES", "Western Mediterranean"),
    coastal("YOR", "Yorkshire", false, None),
];
