//! Resolving "add the blue saree" to one catalog product.
//!
//! A [`ProductQuery`] is parsed from the message, then every candidate is
//! scored:
//!
//! | signal                                                   | points |
//! |----------------------------------------------------------|--------|
//! | name matches the requested product type                  | +100   |
//! | category matches the demographic (men, women, kids)      | +50    |
//! | each query keyword found in the name or category         | +10    |
//!
//! A candidate needs at least [`MIN_MATCH_SCORE`]. The first candidate with
//! the highest score wins.

use domain::Product;

pub const TYPE_MATCH_SCORE: u32 = 100;
pub const DEMOGRAPHIC_MATCH_SCORE: u32 = 50;
pub const KEYWORD_MATCH_SCORE: u32 = 10;
pub const MIN_MATCH_SCORE: u32 = 10;

const COLORS: &[&str] = &[
    "blue", "red", "green", "black", "white", "pink", "yellow", "purple", "orange", "silk",
];

/// Garment and accessory types, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    Saree,
    Shirt,
    TShirt,
    Anarkali,
    Kurta,
    Dress,
    Jeans,
    Lehenga,
    Suit,
    Blazer,
    Trouser,
    Watch,
    Shoe,
    Bag,
    Accessory,
}

impl ProductType {
    const ALL: [ProductType; 15] = [
        ProductType::Saree,
        ProductType::Shirt,
        ProductType::TShirt,
        ProductType::Anarkali,
        ProductType::Kurta,
        ProductType::Dress,
        ProductType::Jeans,
        ProductType::Lehenga,
        ProductType::Suit,
        ProductType::Blazer,
        ProductType::Trouser,
        ProductType::Watch,
        ProductType::Shoe,
        ProductType::Bag,
        ProductType::Accessory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Saree => "saree",
            ProductType::Shirt => "shirt",
            ProductType::TShirt => "t-shirt",
            ProductType::Anarkali => "anarkali",
            ProductType::Kurta => "kurta",
            ProductType::Dress => "dress",
            ProductType::Jeans => "jeans",
            ProductType::Lehenga => "lehenga",
            ProductType::Suit => "suit",
            ProductType::Blazer => "blazer",
            ProductType::Trouser => "trouser",
            ProductType::Watch => "watch",
            ProductType::Shoe => "shoe",
            ProductType::Bag => "bag",
            ProductType::Accessory => "accessory",
        }
    }

    fn mentioned_in(&self, text: &str) -> bool {
        match self {
            ProductType::Saree => text.contains("saree") || text.contains("sari"),
            ProductType::Shirt => {
                text.contains("shirt") && !text.contains("t-shirt") && !text.contains("tshirt")
            }
            ProductType::TShirt => {
                text.contains("t-shirt") || text.contains("tshirt") || text.contains("polo")
            }
            ProductType::Suit => text.contains("suit") && !text.contains("anarkali"),
            ProductType::Trouser => text.contains("trouser") || text.contains("pant"),
            ProductType::Accessory => text.contains("accessor"),
            other => text.contains(other.as_str()),
        }
    }

    /// Words added to the query keywords when this type is mentioned.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            ProductType::TShirt => &["t-shirt", "polo", "tee"],
            ProductType::Trouser => &["trouser", "pant", "chino"],
            ProductType::Accessory => &["accessor"],
            ProductType::Saree => &["saree"],
            ProductType::Shirt => &["shirt"],
            ProductType::Anarkali => &["anarkali"],
            ProductType::Kurta => &["kurta"],
            ProductType::Dress => &["dress"],
            ProductType::Jeans => &["jeans"],
            ProductType::Lehenga => &["lehenga"],
            ProductType::Suit => &["suit"],
            ProductType::Blazer => &["blazer"],
            ProductType::Watch => &["watch"],
            ProductType::Shoe => &["shoe"],
            ProductType::Bag => &["bag"],
        }
    }

    /// Whether a product is of this type. A plain shirt never matches a
    /// t-shirt and vice versa.
    pub fn matches(&self, product: &Product) -> bool {
        let name = product.name_lower();
        match self {
            ProductType::Shirt => name.contains("shirt") && !name.contains("t-shirt"),
            ProductType::TShirt => name.contains("t-shirt") || name.contains("polo"),
            ProductType::Accessory => product.category_lower().contains("accessor"),
            other => name.contains(other.as_str()),
        }
    }
}

fn contains_any(text: &str, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| text.contains(c))
}

/// Who the product is for. Matched on substrings, so "women" also sets
/// the men flag and a "Women's" category passes the men check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Demographics {
    pub men: bool,
    pub women: bool,
    pub girl: bool,
    pub boy: bool,
    pub kid: bool,
}

impl Demographics {
    fn parse(text: &str) -> Self {
        Self {
            men: contains_any(text, &["men", "man"]),
            women: contains_any(text, &["women", "woman"]),
            girl: text.contains("girl"),
            boy: text.contains("boy"),
            kid: contains_any(text, &["kid", "child"]),
        }
    }

    pub fn wants_kids(&self) -> bool {
        self.girl || self.boy || self.kid
    }

    /// Checks men, then women, then kids. Only the first applicable check
    /// counts.
    fn matches(&self, category: &str) -> bool {
        let kids_category = category.contains("kids") || category.contains("children");
        if self.men && category.contains("men") {
            true
        } else if self.women && category.contains("women") {
            true
        } else if (self.girl || self.kid) && (kids_category || category.contains("girl")) {
            true
        } else {
            (self.boy || self.kid) && (kids_category || category.contains("boy"))
        }
    }
}

/// What the customer asked for, parsed from one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub product_type: Option<ProductType>,
    pub keywords: Vec<&'static str>,
    pub demographics: Demographics,
}

impl ProductQuery {
    pub fn parse(message: &str) -> Self {
        let text = message.to_lowercase();

        let mentioned: Vec<ProductType> = ProductType::ALL
            .into_iter()
            .filter(|t| t.mentioned_in(&text))
            .collect();

        let mut keywords: Vec<&'static str> =
            mentioned.iter().flat_map(|t| t.keywords()).copied().collect();
        keywords.extend(COLORS.iter().copied().filter(|c| text.contains(*c)));

        Self {
            product_type: mentioned.first().copied(),
            keywords,
            demographics: Demographics::parse(&text),
        }
    }

    /// Nothing product-specific was mentioned.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn score(&self, product: &Product) -> u32 {
        let name = product.name_lower();
        let category = product.category_lower();
        let mut score = 0;

        if self.product_type.is_some_and(|t| t.matches(product)) {
            score += TYPE_MATCH_SCORE;
        }
        if self.demographics.matches(&category) {
            score += DEMOGRAPHIC_MATCH_SCORE;
        }
        for keyword in &self.keywords {
            if name.contains(keyword) || category.contains(keyword) {
                score += KEYWORD_MATCH_SCORE;
            }
        }

        score
    }

    /// The highest scoring candidate, if any reaches [`MIN_MATCH_SCORE`].
    /// Ties keep the earliest candidate.
    pub fn best_match<'a>(&self, candidates: &'a [Product]) -> Option<&'a Product> {
        let mut best: Option<(&Product, u32)> = None;
        for product in candidates {
            let score = self.score(product);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((product, score));
            }
        }
        best.filter(|(_, score)| *score >= MIN_MATCH_SCORE)
            .map(|(product, _)| product)
    }

    /// Picks the product to add: best match in the catalog, then in the
    /// last recommendations. Failing both, a children's request takes any
    /// product whose name contains the bare type word, and anything else
    /// gets the first catalog product.
    pub fn resolve(&self, catalog: &[Product], recommendations: &[Product]) -> Option<Product> {
        if let Some(product) = self.best_match(catalog) {
            return Some(product.clone());
        }
        if let Some(product) = self.best_match(recommendations) {
            tracing::debug!(sku = %product.sku, "matched from recommendations");
            return Some(product.clone());
        }

        if self.demographics.wants_kids()
            && let Some(kind) = self.product_type
            && let Some(product) = catalog
                .iter()
                .find(|p| p.name_lower().contains(kind.as_str()))
        {
            return Some(product.clone());
        }

        tracing::warn!(keywords = ?self.keywords, "no match, falling back to first catalog product");
        catalog.first().cloned()
    }
}
