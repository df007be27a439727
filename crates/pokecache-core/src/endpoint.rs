//! Catalog endpoints, sprite categories, and the keys built from them.
//!
//! Every cache key and every remote URL in the library is composed here, so
//! the scheme `{endpoint}/[{id}/][{subresource}/]` for documents and
//! `{category}/[{variant}/...]{id}.png` for sprites lives in one place.

use std::fmt;
use std::str::FromStr;

use crate::error::{CatalogError, Result};

/// Invokes `$callback!` with the full endpoint table:
/// `Variant => "wire-name", accessor_name;`
macro_rules! with_endpoint_table {
    ($callback:ident) => {
        $callback! {
            Ability => "ability", ability;
            Berry => "berry", berry;
            BerryFirmness => "berry-firmness", berry_firmness;
            BerryFlavor => "berry-flavor", berry_flavor;
            Characteristic => "characteristic", characteristic;
            ContestEffect => "contest-effect", contest_effect;
            ContestType => "contest-type", contest_type;
            EggGroup => "egg-group", egg_group;
            EncounterCondition => "encounter-condition", encounter_condition;
            EncounterConditionValue => "encounter-condition-value", encounter_condition_value;
            EncounterMethod => "encounter-method", encounter_method;
            EvolutionChain => "evolution-chain", evolution_chain;
            EvolutionTrigger => "evolution-trigger", evolution_trigger;
            Gender => "gender", gender;
            Generation => "generation", generation;
            GrowthRate => "growth-rate", growth_rate;
            Item => "item", item;
            ItemAttribute => "item-attribute", item_attribute;
            ItemCategory => "item-category", item_category;
            ItemFlingEffect => "item-fling-effect", item_fling_effect;
            ItemPocket => "item-pocket", item_pocket;
            Language => "language", language;
            Location => "location", location;
            LocationArea => "location-area", location_area;
            Machine => "machine", machine;
            Move => "move", move_;
            MoveAilment => "move-ailment", move_ailment;
            MoveBattleStyle => "move-battle-style", move_battle_style;
            MoveCategory => "move-category", move_category;
            MoveDamageClass => "move-damage-class", move_damage_class;
            MoveLearnMethod => "move-learn-method", move_learn_method;
            MoveTarget => "move-target", move_target;
            Nature => "nature", nature;
            PalParkArea => "pal-park-area", pal_park_area;
            PokeathlonStat => "pokeathlon-stat", pokeathlon_stat;
            Pokedex => "pokedex", pokedex;
            Pokemon => "pokemon", pokemon;
            PokemonColor => "pokemon-color", pokemon_color;
            PokemonForm => "pokemon-form", pokemon_form;
            PokemonHabitat => "pokemon-habitat", pokemon_habitat;
            PokemonShape => "pokemon-shape", pokemon_shape;
            PokemonSpecies => "pokemon-species", pokemon_species;
            Region => "region", region;
            Stat => "stat", stat;
            SuperContestEffect => "super-contest-effect", super_contest_effect;
            Type => "type", type_;
            Version => "version", version;
            VersionGroup => "version-group", version_group;
        }
    };
}

pub(crate) use with_endpoint_table;

macro_rules! define_endpoints {
    ($($variant:ident => $name:literal, $accessor:ident;)*) => {
        /// A named partition of the remote catalog.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Endpoint {
            $($variant,)*
        }

        impl Endpoint {
            pub const ALL: &'static [Endpoint] = &[$(Endpoint::$variant,)*];

            /// Name used in URLs and cache keys.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Endpoint::$variant => $name,)*
                }
            }

            /// Name of the convenience accessor on `CatalogClient`.
            pub fn accessor_name(&self) -> &'static str {
                match self {
                    $(Endpoint::$variant => stringify!($accessor),)*
                }
            }

            fn from_wire_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Endpoint::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

with_endpoint_table!(define_endpoints);

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = CatalogError;

    /// Accepts the wire name, tolerating case, spaces and underscores
    /// (`"Berry Firmness"` and `"berry_firmness"` both parse).
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        Endpoint::from_wire_name(&normalized)
            .ok_or_else(|| CatalogError::UnknownEndpoint(s.to_string()))
    }
}

/// Splits a catalog URL into its non-empty path segments.
fn url_segments(url: &str) -> Vec<&str> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn parse_id(segment: &str) -> Result<u32> {
    segment
        .parse()
        .map_err(|_| CatalogError::InvalidId(segment.to_string()))
}

/// Minimal identity of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub endpoint: Endpoint,
    pub id: u32,
}

impl ResourceRef {
    pub fn new(endpoint: Endpoint, id: u32) -> Self {
        Self { endpoint, id }
    }

    /// Parse `.../{endpoint}/{id}/` into a reference.
    pub fn from_url(url: &str) -> Result<Self> {
        let segments = url_segments(url);
        match segments.as_slice() {
            [.., endpoint, id] => Ok(Self {
                endpoint: endpoint.parse()?,
                id: parse_id(id)?,
            }),
            _ => Err(CatalogError::InvalidId(url.to_string())),
        }
    }

    pub fn document_key(&self) -> DocumentKey {
        DocumentKey::entry(self.endpoint, self.id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.endpoint, self.id)
    }
}

/// Address of one JSON document: a listing, an entry, or an entry's
/// subresource. A subresource always hangs off an entry id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    endpoint: Endpoint,
    id: Option<u32>,
    subresource: Option<String>,
}

impl DocumentKey {
    pub fn listing(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            id: None,
            subresource: None,
        }
    }

    pub fn entry(endpoint: Endpoint, id: u32) -> Self {
        Self {
            endpoint,
            id: Some(id),
            subresource: None,
        }
    }

    pub fn subresource(endpoint: Endpoint, id: u32, subresource: impl Into<String>) -> Self {
        Self {
            endpoint,
            id: Some(id),
            subresource: Some(subresource.into()),
        }
    }

    /// Parse `.../{endpoint}/{id}/{subresource}` into a key.
    pub fn from_subresource_url(url: &str) -> Result<Self> {
        let segments = url_segments(url);
        match segments.as_slice() {
            [.., endpoint, id, sub] => Ok(Self::subresource(endpoint.parse()?, parse_id(id)?, *sub)),
            _ => Err(CatalogError::InvalidId(url.to_string())),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn id(&self) -> Option<u32> {
        self.id
    }

    pub fn subresource_name(&self) -> Option<&str> {
        self.subresource.as_deref()
    }

    pub fn is_listing(&self) -> bool {
        self.id.is_none()
    }

    /// `{endpoint}/[{id}/][{subresource}/]`
    pub fn cache_key(&self) -> String {
        let mut key = format!("{}/", self.endpoint);
        if let Some(id) = self.id {
            key.push_str(&format!("{}/", id));
            if let Some(ref sub) = self.subresource {
                key.push_str(&format!("{}/", sub));
            }
        }
        key
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.cache_key())
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// Kind of sprite asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteCategory {
    Pokemon,
}

impl SpriteCategory {
    pub const ALL: &'static [SpriteCategory] = &[SpriteCategory::Pokemon];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpriteCategory::Pokemon => "pokemon",
        }
    }
}

impl fmt::Display for SpriteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpriteCategory {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pokemon" => Ok(SpriteCategory::Pokemon),
            _ => Err(CatalogError::UnknownCategory(s.to_string())),
        }
    }
}

/// Size/variant flags selecting one image of a sprite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpriteOptions {
    pub official_artwork: bool,
    pub back: bool,
    pub female: bool,
    pub shiny: bool,
}

impl SpriteOptions {
    pub fn official_artwork() -> Self {
        Self {
            official_artwork: true,
            ..Self::default()
        }
    }

    pub fn back(mut self) -> Self {
        self.back = true;
        self
    }

    pub fn female(mut self) -> Self {
        self.female = true;
        self
    }

    pub fn shiny(mut self) -> Self {
        self.shiny = true;
        self
    }

    /// Directory segments between the category and the file name.
    fn segments(&self) -> Result<Vec<&'static str>> {
        let mut segments = Vec::new();
        if self.official_artwork {
            if self.back || self.female {
                return Err(CatalogError::InvalidSpriteOptions(
                    "official artwork has no back or female variants".to_string(),
                ));
            }
            segments.extend(["other", "official-artwork"]);
        } else if self.back {
            segments.push("back");
        }
        if self.shiny {
            segments.push("shiny");
        }
        if self.female {
            segments.push("female");
        }
        Ok(segments)
    }
}

/// Address of one sprite image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteKey {
    category: SpriteCategory,
    id: i64,
    options: SpriteOptions,
    relative_path: String,
}

impl SpriteKey {
    pub fn new(category: SpriteCategory, id: i64, options: SpriteOptions) -> Result<Self> {
        let mut parts: Vec<String> = vec![category.as_str().to_string()];
        parts.extend(options.segments()?.into_iter().map(str::to_string));
        parts.push(format!("{}.png", id));
        Ok(Self {
            category,
            id,
            options,
            relative_path: parts.join("/"),
        })
    }

    pub fn category(&self) -> SpriteCategory {
        self.category
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn options(&self) -> SpriteOptions {
        self.options
    }

    /// `{category}/[{variant}/...]{id}.png`, relative to the sprite cache.
    pub fn cache_key(&self) -> &str {
        &self.relative_path
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.relative_path)
    }
}
