// Score aggregation — spec §4.4. `aggregate` turns accumulated indicator
// evidence into a `Report`; `partners` resolves author_id -> display handle
// for reason strings.

pub mod aggregate;
pub mod partners;

pub use aggregate::aggregate;
