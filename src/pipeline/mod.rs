//! Pure transforms over already-fetched records.
//!
//! - `aggregate`: frequency tables and cross-tabs for statistics charts
//! - `pager`: stable slicing for listing screens
//! - `filter` / `listing`: search box and listing state

pub mod aggregate;
pub mod filter;
pub mod listing;
pub mod pager;

pub use aggregate::{
    GroupKey, cross_tab, group_by_field, order_rows, sort_by_count_desc, sort_by_natural_key,
    sort_cross_tab_rows, top_n,
};
pub use filter::SearchFilter;
pub use listing::Listing;
pub use pager::{Pager, clamp_page, paginate, total_pages};
