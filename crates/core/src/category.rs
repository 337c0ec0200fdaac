use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Shopping,
    Travel,
    Utilities,
    Entertainment,
    Healthcare,
    Groceries,
    Fuel,
    Emi,
    Insurance,
    Automobiles,
    Jewellery,
    Electronics,
    Other,
}

/// Keyword table in match order. The first category with any keyword
/// contained in the lower-cased description wins, so entry order decides
/// between categories that share a match.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Food,
        &[
            "swiggy", "zomato", "restaurant", "cafe", "food", "pizza", "burger", "kitchen",
            "dhaba", "biryani", "bakery", "sweet", "juice", "tea", "coffee", "starbucks",
            "mcdonald", "kfc", "domino", "subway", "dining", "bundl", "mc donalds",
        ],
    ),
    (
        Category::Shopping,
        &[
            "amazon", "flipkart", "myntra", "ajio", "mall", "retail", "store", "mart", "bazaar",
            "shoppers", "lifestyle", "westside", "pantaloons", "reliance trends", "max fashion",
            "h&m", "zara", "decathlon",
        ],
    ),
    (
        Category::Travel,
        &[
            "uber", "ola", "rapido", "irctc", "railway", "airline", "makemytrip", "hotel", "oyo",
            "goibibo", "yatra", "cleartrip", "indigo", "spicejet", "air india", "vistara",
            "booking.com", "airbnb", "cab", "taxi",
        ],
    ),
    (
        Category::Utilities,
        &[
            "electricity", "airtel", "jio", "vodafone", "bsnl", "broadband", "gas", "water",
            "bill", "recharge", "postpaid", "prepaid", "dth", "tata sky", "dish tv", "internet",
            "atria convergence",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "netflix", "hotstar", "spotify", "prime video", "movie", "pvr", "inox", "bookmyshow",
            "gaming", "playstation", "xbox", "steam", "youtube", "disney", "zee5", "sonyliv",
            "jiocinema", "cinema", "multiplex",
        ],
    ),
    (
        Category::Healthcare,
        &[
            "hospital", "pharmacy", "medical", "apollo", "medplus", "clinic", "diagnostic", "lab",
            "doctor", "medicine", "pharma", "health", "netmeds", "1mg", "practo", "dental",
            "optical", "rxdx",
        ],
    ),
    (
        Category::Groceries,
        &[
            "bigbasket", "zepto", "blinkit", "dmart", "reliance fresh", "supermarket", "grofers",
            "jiomart", "spencer", "more supermarket", "nature basket", "organic", "vegetables",
            "fruits", "daily needs", "instamart", "bbnow", "innovative retail", "bb daily",
        ],
    ),
    (
        Category::Fuel,
        &[
            "petrol", "diesel", "hp ", "indian oil", "bharat petroleum", "shell", "fuel", "iocl",
            "bpcl", "hpcl", "filling station", "gas station", "mohan n p enter",
        ],
    ),
    (
        Category::Emi,
        &[
            "emi", "loan", "finserv", "bajaj", "hdfc ltd", "icici bank emi", "credit card emi",
            "no cost emi",
        ],
    ),
    (Category::Insurance, &["generali central", "niva bupa", "icici lombard"]),
    (Category::Automobiles, &["epitome automobiles", "k h t agencies"]),
    (
        Category::Jewellery,
        &["malabar gold", "bluestone jewellery", "tanishq", "neelkanth jewel"],
    ),
    (Category::Electronics, &["rel retail ltd digital", "adishwar india"]),
];

impl Category {
    /// Every category, keyword-table order first, `Other` last.
    pub const ALL: [Category; 14] = [
        Category::Food,
        Category::Shopping,
        Category::Travel,
        Category::Utilities,
        Category::Entertainment,
        Category::Healthcare,
        Category::Groceries,
        Category::Fuel,
        Category::Emi,
        Category::Insurance,
        Category::Automobiles,
        Category::Jewellery,
        Category::Electronics,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Shopping => "shopping",
            Category::Travel => "travel",
            Category::Utilities => "utilities",
            Category::Entertainment => "entertainment",
            Category::Healthcare => "healthcare",
            Category::Groceries => "groceries",
            Category::Fuel => "fuel",
            Category::Emi => "emi",
            Category::Insurance => "insurance",
            Category::Automobiles => "automobiles",
            Category::Jewellery => "jewellery",
            Category::Electronics => "electronics",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category: '{s}'"))
    }
}

/// Assign a spending category by keyword containment.
pub fn categorize(description: &str) -> Category {
    let text = description.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}
