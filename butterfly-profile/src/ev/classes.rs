//! Enum value sets for the built-in encoded values
//!
//! The declaration order is the storage order: index 0 is the default a fresh edge
//! reads back, and reordering variants changes the on-disk meaning of stored flags.

macro_rules! encoded_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Name used in custom model conditions
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn index(self) -> u16 {
                self as u16
            }

            pub fn from_index(index: u16) -> Option<Self> {
                Self::ALL.get(index as usize).copied()
            }

            /// Value names in storage order, for declaring the encoded value
            pub fn names() -> Vec<String> {
                Self::ALL.iter().map(|v| v.as_str().to_string()).collect()
            }
        }
    };
}

encoded_enum! {
    /// `highway=*` classification; `_link` variants map to their parent class
    RoadClass {
        Other => "OTHER",
        Motorway => "MOTORWAY",
        Trunk => "TRUNK",
        Primary => "PRIMARY",
        Secondary => "SECONDARY",
        Tertiary => "TERTIARY",
        Residential => "RESIDENTIAL",
        Unclassified => "UNCLASSIFIED",
        Service => "SERVICE",
        Road => "ROAD",
        Track => "TRACK",
        Bridleway => "BRIDLEWAY",
        Steps => "STEPS",
        Cycleway => "CYCLEWAY",
        Path => "PATH",
        LivingStreet => "LIVING_STREET",
        Footway => "FOOTWAY",
        Pedestrian => "PEDESTRIAN",
        Platform => "PLATFORM",
        Corridor => "CORRIDOR",
        Construction => "CONSTRUCTION",
    }
}

impl RoadClass {
    pub fn from_highway(highway: &str) -> RoadClass {
        let base = highway.strip_suffix("_link").unwrap_or(highway);
        match base {
            "motorway" => RoadClass::Motorway,
            "trunk" => RoadClass::Trunk,
            "primary" => RoadClass::Primary,
            "secondary" => RoadClass::Secondary,
            "tertiary" => RoadClass::Tertiary,
            "residential" => RoadClass::Residential,
            "unclassified" => RoadClass::Unclassified,
            "service" => RoadClass::Service,
            "road" => RoadClass::Road,
            "track" => RoadClass::Track,
            "bridleway" => RoadClass::Bridleway,
            "steps" => RoadClass::Steps,
            "cycleway" => RoadClass::Cycleway,
            "path" => RoadClass::Path,
            "living_street" => RoadClass::LivingStreet,
            "footway" => RoadClass::Footway,
            "pedestrian" => RoadClass::Pedestrian,
            "platform" => RoadClass::Platform,
            "corridor" => RoadClass::Corridor,
            "construction" => RoadClass::Construction,
            _ => RoadClass::Other,
        }
    }
}

encoded_enum! {
    /// Legal access, ordered from least to most restrictive
    RoadAccess {
        Yes => "YES",
        Destination => "DESTINATION",
        Customers => "CUSTOMERS",
        Delivery => "DELIVERY",
        Forestry => "FORESTRY",
        Agricultural => "AGRICULTURAL",
        Private => "PRIVATE",
        No => "NO",
    }
}

impl RoadAccess {
    /// Interpret an OSM access value; `None` for values with no road access meaning
    pub fn from_tag(value: &str) -> Option<RoadAccess> {
        match value.trim() {
            "yes" | "permissive" | "designated" | "official" => Some(RoadAccess::Yes),
            "destination" => Some(RoadAccess::Destination),
            "customers" => Some(RoadAccess::Customers),
            "delivery" => Some(RoadAccess::Delivery),
            "forestry" => Some(RoadAccess::Forestry),
            "agricultural" => Some(RoadAccess::Agricultural),
            "private" | "permit" | "residents" => Some(RoadAccess::Private),
            "no" | "restricted" | "military" | "emergency" => Some(RoadAccess::No),
            _ => None,
        }
    }
}

encoded_enum! {
    Surface {
        Missing => "MISSING",
        Paved => "PAVED",
        Asphalt => "ASPHALT",
        Concrete => "CONCRETE",
        PavingStones => "PAVING_STONES",
        Cobblestone => "COBBLESTONE",
        Unpaved => "UNPAVED",
        Compacted => "COMPACTED",
        FineGravel => "FINE_GRAVEL",
        Gravel => "GRAVEL",
        Ground => "GROUND",
        Dirt => "DIRT",
        Grass => "GRASS",
        Sand => "SAND",
        Wood => "WOOD",
        Other => "OTHER",
    }
}

impl Surface {
    pub fn from_tag(value: &str) -> Surface {
        // "asphalt;gravel" - the first listed surface dominates
        let value = value.split(';').next().unwrap_or_default().trim();
        match value {
            "" => Surface::Missing,
            "paved" => Surface::Paved,
            "asphalt" | "chipseal" => Surface::Asphalt,
            "concrete" | "concrete:plates" | "concrete:lanes" => Surface::Concrete,
            "paving_stones" | "paving_stones:30" | "sett" => Surface::PavingStones,
            "cobblestone" | "unhewn_cobblestone" => Surface::Cobblestone,
            "unpaved" => Surface::Unpaved,
            "compacted" => Surface::Compacted,
            "fine_gravel" => Surface::FineGravel,
            "gravel" | "pebblestone" => Surface::Gravel,
            "ground" | "earth" => Surface::Ground,
            "dirt" | "mud" => Surface::Dirt,
            "grass" | "grass_paver" => Surface::Grass,
            "sand" => Surface::Sand,
            "wood" => Surface::Wood,
            _ => Surface::Other,
        }
    }

    pub fn is_unpaved(&self) -> bool {
        matches!(
            self,
            Surface::Unpaved
                | Surface::Compacted
                | Surface::FineGravel
                | Surface::Gravel
                | Surface::Ground
                | Surface::Dirt
                | Surface::Grass
                | Surface::Sand
        )
    }
}

encoded_enum! {
    Toll {
        Missing => "MISSING",
        No => "NO",
        Hgv => "HGV",
        All => "ALL",
    }
}

encoded_enum! {
    /// Hiking/walking route network a way belongs to (from route relations)
    RouteNetwork {
        Missing => "MISSING",
        International => "INTERNATIONAL",
        National => "NATIONAL",
        Regional => "REGIONAL",
        Local => "LOCAL",
        Other => "OTHER",
    }
}

impl RouteNetwork {
    /// Interpret a route relation's `network` tag (`iwn`, `nwn`, `rwn`, `lwn`)
    pub fn from_network_tag(value: &str) -> RouteNetwork {
        match value {
            "iwn" => RouteNetwork::International,
            "nwn" => RouteNetwork::National,
            "rwn" => RouteNetwork::Regional,
            "lwn" => RouteNetwork::Local,
            "" => RouteNetwork::Missing,
            _ => RouteNetwork::Other,
        }
    }
}
