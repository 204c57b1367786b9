//! Polish alphabetical ordering for digest titles, backed by the CLDR `pl`
//! collation (`A < Ą < B < C < Ć …`, `Z < Ź < Ż`).

use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use std::cmp::Ordering;

use crate::utils::error::{DigestError, Result};

pub struct PolishCollation {
    collator: Collator,
}

impl PolishCollation {
    pub fn new() -> Result<Self> {
        let collator = Collator::try_new(&locale!("pl").into(), CollatorOptions::new())
            .map_err(|e| DigestError::processing(format!("Polish collation unavailable: {}", e)))?;
        Ok(Self { collator })
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b)
    }
}
