//! Listing category resolution - Picks a display title and photo bucket.
//!
//! Depots describe stock in free text ("40' High Cube", "40HC", "40ft HC
//! Refrigerated", ...). Resolution normalises the type, condition and SKU
//! strings and walks one ordered table of rules. Each rule is a conjunction
//! of substring tests; the first rule that holds selects the bucket, so the
//! table runs from the most specific combinations down to the generic grades.
//!
//! Resolution is read-only: listings are never rewritten with the result.

use crate::config::app::PhotoConfig;
use serde::Serialize;

/// Whether a bucket renders a photo set or an out-of-stock notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stock {
    /// Render the bucket's photos
    Available,
    /// Render as out of stock regardless of the listing quantity
    Unavailable,
}

/// A named photo set with its display title
#[derive(Debug, PartialEq, Eq)]
pub struct Bucket {
    /// Stable identifier, also the photo directory name
    pub key: &'static str,
    /// Title shown on listing cards
    pub title: &'static str,
    /// Number of photos in the bucket directory (`1.jpg`..`n.jpg`)
    pub photo_count: u8,
    /// Stock rendering
    pub stock: Stock,
}

impl Bucket {
    const fn available(key: &'static str, title: &'static str, photo_count: u8) -> Self {
        Self {
            key,
            title,
            photo_count,
            stock: Stock::Available,
        }
    }

    const fn unavailable(key: &'static str, title: &'static str) -> Self {
        Self {
            key,
            title,
            photo_count: 0,
            stock: Stock::Unavailable,
        }
    }

    /// Photo URLs for this bucket under `base_url`
    #[must_use]
    pub fn photo_urls(&self, base_url: &str) -> Vec<String> {
        let base = base_url.trim_end_matches('/');
        (1..=self.photo_count)
            .map(|n| format!("{base}/{}/{n}.jpg", self.key))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Type,
    Condition,
    /// SKU or condition; grade words show up in either
    Grade,
}

#[derive(Debug, Clone, Copy)]
enum Term {
    Has(Field, &'static [&'static str]),
    Lacks(Field, &'static [&'static str]),
    HighCube,
    NotHighCube,
    /// Plain dry box: none of the specialty markers
    Dry,
}

struct Rule {
    when: &'static [Term],
    bucket: Bucket,
}

const SIZE_10: &[&str] = &["10"];
const SIZE_20: &[&str] = &["20"];
const SIZE_40: &[&str] = &["40"];
const SIZE_45: &[&str] = &["45"];
const SIZE_53: &[&str] = &["53"];

const HIGH_CUBE: &[&str] = &["hc", "highcube", "hq"];

const REEFER: &[&str] = &["reefer", "refrigerat", "refer", "rfr"];
const OPEN_TOP: &[&str] = &["opentop", "20ot", "40ot", "53ot", "hcot"];
const DOUBLE_DOOR: &[&str] = &["doubledoor", "tunnel", "20dd", "40dd", "hcdd"];
const OPEN_SIDE: &[&str] = &["openside", "sidedoor", "sideopening", "20os", "40os", "hcos"];
const FLAT_RACK: &[&str] = &["flatrack", "20fr", "40fr"];
const SPECIALTY: [&[&str]; 5] = [REEFER, OPEN_TOP, DOUBLE_DOOR, OPEN_SIDE, FLAT_RACK];

const BRAND_NEW: &[&str] = &["brandnew", "onetrip", "1trip", "newbuild"];
const IICL: &[&str] = &["iicl"];
const CARGO_WORTHY: &[&str] = &["cargoworthy", "cw"];
const WWT: &[&str] = &["wwt", "windandwatertight", "windwatertight"];
// Condition only: "asis" is a substring of "chassis" in SKUs.
const AS_IS: &[&str] = &["asis"];

use Field::{Condition, Grade, Type};
use Term::{Dry, Has, HighCube, Lacks, NotHighCube};

static RULES: &[Rule] = &[
    // Open top
    Rule {
        when: &[Has(Type, SIZE_53), Has(Type, OPEN_TOP), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("53-open-top-brand-new", "53' Open Top Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_53), Has(Type, OPEN_TOP)],
        bucket: Bucket::available("53-open-top", "53' Open Top", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Has(Type, OPEN_TOP), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("40hc-open-top-brand-new", "40' High Cube Open Top Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Has(Type, OPEN_TOP)],
        bucket: Bucket::available("40hc-open-top", "40' High Cube Open Top", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_40), Has(Type, OPEN_TOP), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("40-open-top-brand-new", "40' Open Top Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_40), Has(Type, OPEN_TOP)],
        bucket: Bucket::available("40-open-top", "40' Open Top", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_20), Has(Type, OPEN_TOP), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("20-open-top-brand-new", "20' Open Top Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_20), Has(Type, OPEN_TOP)],
        bucket: Bucket::available("20-open-top", "20' Open Top", 3),
    },
    Rule {
        when: &[Has(Type, OPEN_TOP)],
        bucket: Bucket::available("open-top", "Open Top Container", 2),
    },
    // Refrigerated
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Has(Type, REEFER), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("40hc-reefer-brand-new", "40' High Cube Reefer Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Has(Type, REEFER)],
        bucket: Bucket::available("40hc-reefer", "40' High Cube Reefer", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_40), Has(Type, REEFER)],
        bucket: Bucket::available("40-reefer", "40' Reefer", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_20), Has(Type, REEFER), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("20-reefer-brand-new", "20' Reefer Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_20), Has(Type, REEFER)],
        bucket: Bucket::available("20-reefer", "20' Reefer", 3),
    },
    Rule {
        when: &[Has(Type, REEFER)],
        bucket: Bucket::available("reefer", "Refrigerated Container", 2),
    },
    // Double door
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Has(Type, DOUBLE_DOOR), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available(
            "40hc-double-door-brand-new",
            "40' High Cube Double Door Brand New",
            4,
        ),
    },
    Rule {
        when: &[Has(Type, SIZE_40), Has(Type, DOUBLE_DOOR)],
        bucket: Bucket::available("40-double-door", "40' Double Door", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_20), Has(Type, DOUBLE_DOOR), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("20-double-door-brand-new", "20' Double Door Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_20), Has(Type, DOUBLE_DOOR)],
        bucket: Bucket::available("20-double-door", "20' Double Door", 3),
    },
    Rule {
        when: &[Has(Type, DOUBLE_DOOR)],
        bucket: Bucket::available("double-door", "Double Door Container", 2),
    },
    // Open side
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Has(Type, OPEN_SIDE), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available(
            "40hc-open-side-brand-new",
            "40' High Cube Open Side Brand New",
            4,
        ),
    },
    Rule {
        when: &[Has(Type, SIZE_20), Has(Type, OPEN_SIDE), Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("20-open-side-brand-new", "20' Open Side Brand New", 4),
    },
    Rule {
        when: &[Has(Type, OPEN_SIDE)],
        bucket: Bucket::available("open-side", "Open Side Container", 2),
    },
    // Flat rack
    Rule {
        when: &[Has(Type, SIZE_40), Has(Type, FLAT_RACK)],
        bucket: Bucket::available("40-flat-rack", "40' Flat Rack", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_20), Has(Type, FLAT_RACK)],
        bucket: Bucket::available("20-flat-rack", "20' Flat Rack", 3),
    },
    Rule {
        when: &[Has(Type, FLAT_RACK)],
        bucket: Bucket::available("flat-rack", "Flat Rack", 2),
    },
    // 53' high cube
    Rule {
        when: &[Has(Type, SIZE_53), Dry, Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("53hc-brand-new", "53' High Cube Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_53), Dry, Has(Condition, AS_IS)],
        bucket: Bucket::unavailable("53hc-unavailable", "53' High Cube As Is"),
    },
    Rule {
        when: &[Has(Type, SIZE_53), Dry, Has(Grade, CARGO_WORTHY)],
        bucket: Bucket::available("53hc-cargo-worthy", "53' High Cube Cargo Worthy", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_53), Dry, Has(Grade, WWT)],
        bucket: Bucket::available("53hc-wwt", "53' High Cube Wind & Water Tight", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_53), Dry],
        bucket: Bucket::available("53hc", "53' High Cube", 3),
    },
    // 45' high cube
    Rule {
        when: &[Has(Type, SIZE_45), Dry, Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("45hc-brand-new", "45' High Cube Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_45), Dry, Has(Grade, IICL)],
        bucket: Bucket::available("45hc-iicl", "45' High Cube IICL", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_45), Dry, Has(Grade, CARGO_WORTHY)],
        bucket: Bucket::available("45hc-cargo-worthy", "45' High Cube Cargo Worthy", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_45), Dry, Has(Grade, WWT)],
        bucket: Bucket::available("45hc-wwt", "45' High Cube Wind & Water Tight", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_45), Dry],
        bucket: Bucket::available("45hc", "45' High Cube", 3),
    },
    // 40' high cube
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Dry, Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("40hc-brand-new", "40' High Cube Brand New", 5),
    },
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Dry, Has(Grade, IICL)],
        bucket: Bucket::available("40hc-iicl", "40' High Cube IICL", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Dry, Has(Grade, CARGO_WORTHY)],
        bucket: Bucket::available("40hc-cargo-worthy", "40' High Cube Cargo Worthy", 5),
    },
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Dry, Has(Grade, WWT)],
        bucket: Bucket::available("40hc-wwt", "40' High Cube Wind & Water Tight", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Dry, Has(Condition, AS_IS)],
        bucket: Bucket::available("40hc-as-is", "40' High Cube As Is", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_40), HighCube, Dry],
        bucket: Bucket::available("40hc", "40' High Cube", 3),
    },
    // 40' standard
    Rule {
        when: &[Has(Type, SIZE_40), NotHighCube, Dry, Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("40-brand-new", "40' Standard Brand New", 5),
    },
    Rule {
        when: &[Has(Type, SIZE_40), NotHighCube, Dry, Has(Grade, IICL)],
        bucket: Bucket::available("40-iicl", "40' Standard IICL", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_40), NotHighCube, Dry, Has(Grade, CARGO_WORTHY)],
        bucket: Bucket::available("40-cargo-worthy", "40' Standard Cargo Worthy", 5),
    },
    Rule {
        when: &[Has(Type, SIZE_40), NotHighCube, Dry, Has(Grade, WWT)],
        bucket: Bucket::available("40-wwt", "40' Standard Wind & Water Tight", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_40), NotHighCube, Dry, Has(Condition, AS_IS)],
        bucket: Bucket::available("40-as-is", "40' Standard As Is", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_40), NotHighCube, Dry],
        bucket: Bucket::available("40", "40' Standard", 3),
    },
    // 20' high cube
    Rule {
        when: &[Has(Type, SIZE_20), HighCube, Dry, Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("20hc-brand-new", "20' High Cube Brand New", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_20), HighCube, Dry],
        bucket: Bucket::unavailable("20hc-unavailable", "20' High Cube Used"),
    },
    // 20' standard
    Rule {
        when: &[Has(Type, SIZE_20), NotHighCube, Dry, Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("20-brand-new", "20' Standard Brand New", 5),
    },
    Rule {
        when: &[Has(Type, SIZE_20), NotHighCube, Dry, Has(Grade, IICL)],
        bucket: Bucket::available("20-iicl", "20' Standard IICL", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_20), NotHighCube, Dry, Has(Grade, CARGO_WORTHY)],
        bucket: Bucket::available("20-cargo-worthy", "20' Standard Cargo Worthy", 5),
    },
    Rule {
        when: &[Has(Type, SIZE_20), NotHighCube, Dry, Has(Grade, WWT)],
        bucket: Bucket::available("20-wwt", "20' Standard Wind & Water Tight", 4),
    },
    Rule {
        when: &[Has(Type, SIZE_20), NotHighCube, Dry, Has(Condition, AS_IS)],
        bucket: Bucket::available("20-as-is", "20' Standard As Is", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_20), NotHighCube, Dry],
        bucket: Bucket::available("20", "20' Standard", 3),
    },
    // 10'
    Rule {
        when: &[Has(Type, SIZE_10), Dry, Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("10-brand-new", "10' Brand New", 3),
    },
    Rule {
        when: &[Has(Type, SIZE_10), Dry],
        bucket: Bucket::available("10", "10' Storage Container", 2),
    },
    // Size unknown: grade only
    Rule {
        when: &[Dry, Has(Grade, BRAND_NEW)],
        bucket: Bucket::available("brand-new", "Brand New Container", 2),
    },
    Rule {
        when: &[Has(Grade, CARGO_WORTHY)],
        bucket: Bucket::available("cargo-worthy", "Cargo Worthy Container", 2),
    },
    Rule {
        when: &[Has(Grade, WWT), Lacks(Type, REEFER), Lacks(Type, OPEN_TOP)],
        bucket: Bucket::available("wwt", "Wind & Water Tight Container", 2),
    },
    Rule {
        when: &[Has(Condition, AS_IS)],
        bucket: Bucket::available("as-is", "As Is Container", 1),
    },
];

/// Lower-cases and strips separators so "40' High-Cube" reads "40highcube".
fn compact(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| {
            !c.is_whitespace() && !matches!(c, '\'' | '"' | '-' | '_' | '/' | '.' | '’' | '′' | '″')
        })
        .collect()
}

struct Normalized {
    container_type: String,
    condition: String,
    sku: String,
}

impl Normalized {
    fn new(container_type: &str, condition: &str, sku: Option<&str>) -> Self {
        Self {
            container_type: compact(container_type),
            condition: compact(condition),
            sku: sku.map(compact).unwrap_or_default(),
        }
    }

    fn has(&self, field: Field, needles: &[&str]) -> bool {
        let contains = |haystack: &str| needles.iter().any(|n| haystack.contains(n));
        match field {
            Field::Type => contains(&self.container_type),
            Field::Condition => contains(&self.condition),
            Field::Grade => contains(&self.sku) || contains(&self.condition),
        }
    }

    fn holds(&self, term: Term) -> bool {
        match term {
            Term::Has(field, needles) => self.has(field, needles),
            Term::Lacks(field, needles) => !self.has(field, needles),
            Term::HighCube => self.has(Field::Type, HIGH_CUBE),
            Term::NotHighCube => !self.has(Field::Type, HIGH_CUBE),
            Term::Dry => !SPECIALTY
                .iter()
                .any(|needles| self.has(Field::Type, needles)),
        }
    }
}

/// Outcome of classifying a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A rule matched
    Matched(&'static Bucket),
    /// No rule matched; callers render the fallback image
    Unmatched,
}

impl Resolution {
    /// The matched bucket, if any
    #[must_use]
    pub const fn bucket(self) -> Option<&'static Bucket> {
        match self {
            Self::Matched(bucket) => Some(bucket),
            Self::Unmatched => None,
        }
    }
}

/// Classifies a listing by its free-text type, condition and SKU.
///
/// The first rule in table order whose terms all hold wins.
#[must_use]
pub fn resolve(container_type: &str, condition: &str, sku: Option<&str>) -> Resolution {
    let listing = Normalized::new(container_type, condition, sku);
    RULES
        .iter()
        .find(|rule| rule.when.iter().all(|term| listing.holds(*term)))
        .map_or(Resolution::Unmatched, |rule| Resolution::Matched(&rule.bucket))
}

/// Iterates every bucket in table order
pub fn buckets() -> impl Iterator<Item = &'static Bucket> {
    RULES.iter().map(|rule| &rule.bucket)
}

/// Display data for a listing card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCategory {
    /// Matched bucket key, `None` when no rule matched
    pub bucket: Option<String>,
    /// Card title
    pub title: String,
    /// Photo URLs, empty when the bucket has none or is unavailable
    pub photos: Vec<String>,
    /// First photo, or the fallback image
    pub primary_photo: String,
    /// False for unavailable buckets
    pub in_stock: bool,
}

/// Resolves a listing and renders its card data.
///
/// Unmatched listings, unavailable buckets and buckets without photos all
/// show `photos.fallback_image`.
#[must_use]
pub fn categorize(
    container_type: &str,
    condition: &str,
    sku: Option<&str>,
    photos: &PhotoConfig,
) -> ListingCategory {
    match resolve(container_type, condition, sku) {
        Resolution::Matched(bucket) => {
            let in_stock = bucket.stock == Stock::Available;
            let urls = if in_stock {
                bucket.photo_urls(&photos.base_url)
            } else {
                Vec::new()
            };
            let primary_photo = urls
                .first()
                .cloned()
                .unwrap_or_else(|| photos.fallback_image.clone());
            ListingCategory {
                bucket: Some(bucket.key.to_string()),
                title: bucket.title.to_string(),
                photos: urls,
                primary_photo,
                in_stock,
            }
        }
        Resolution::Unmatched => ListingCategory {
            bucket: None,
            title: format!("{} {}", container_type.trim(), condition.trim())
                .trim()
                .to_string(),
            photos: Vec::new(),
            primary_photo: photos.fallback_image.clone(),
            in_stock: true,
        },
    }
}
