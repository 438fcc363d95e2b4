use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listing pulled off a results page, before it is attributed to a watch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingCandidate {
    pub name: String,
    pub price: f64,
    pub link: String,
    pub image: Option<String>,
    pub found_at: DateTime<Utc>,
}

/// A validated match ready for notification. Lives for one check pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub name: String,
    pub price: f64,
    pub link: String,
    pub image: Option<String>,
    pub found_at: DateTime<Utc>,
    pub product: String,
    pub site: String,
}

impl ListingCandidate {
    pub fn into_listing(self, product: &str, site: &str) -> Listing {
        Listing {
            name: self.name,
            price: self.price,
            link: self.link,
            image: self.image,
            found_at: self.found_at,
            product: product.to_string(),
            site: site.to_string(),
        }
    }
}

impl Listing {
    /// Identity used when repeat notifications are suppressed.
    pub fn dedup_key(&self) -> String {
        format!("{}|{}|{}", self.product, self.site, self.link)
    }
}

/// What the notifier delivers: a caption-sized text and an optional picture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPayload {
    pub text: String,
    pub image: Option<String>,
}

impl NotificationPayload {
    pub fn from_listing(listing: &Listing) -> Self {
        let text = format!(
            "🎯 Match found!\n\n\
             📦 Product: {}\n\
             🏪 Store: {}\n\
             📋 Title: {}\n\
             💰 Price: {} ₽\n\
             ⏰ Found: {}\n\
             🔗 Link: {}",
            listing.product,
            listing.site,
            listing.name,
            format_price(listing.price),
            listing.found_at.format("%Y-%m-%d %H:%M:%S UTC"),
            listing.link,
        );

        Self {
            text,
            image: listing.image.clone(),
        }
    }
}

pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.0}", price)
    } else {
        format!("{:.2}", price)
    }
}
