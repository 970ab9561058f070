//! State postal abbreviations and their FIPS codes.
//!
//! Census file names carry the two-digit state FIPS code (`tl_2014_41_tract.zip` is
//! Oregon), so state selection on the command line is translated through this table.

/// `(abbreviation, FIPS code, name)` for every state-level area TIGER/Line publishes.
const STATES: &[(&str, &str, &str)] = &[
    ("AL", "01", "Alabama"),
    ("AK", "02", "Alaska"),
    ("AZ", "04", "Arizona"),
    ("AR", "05", "Arkansas"),
    ("CA", "06", "California"),
    ("CO", "08", "Colorado"),
    ("CT", "09", "Connecticut"),
    ("DE", "10", "Delaware"),
    ("DC", "11", "District of Columbia"),
    ("FL", "12", "Florida"),
    ("GA", "13", "Georgia"),
    ("HI", "15", "Hawaii"),
    ("ID", "16", "Idaho"),
    ("IL", "17", "Illinois"),
    ("IN", "18", "Indiana"),
    ("IA", "19", "Iowa"),
    ("KS", "20", "Kansas"),
    ("KY", "21", "Kentucky"),
    ("LA", "22", "Louisiana"),
    ("ME", "23", "Maine"),
    ("MD", "24", "Maryland"),
    ("MA", "25", "Massachusetts"),
    ("MI", "26", "Michigan"),
    ("MN", "27", "Minnesota"),
    ("MS", "28", "Mississippi"),
    ("MO", "29", "Missouri"),
    ("MT", "30", "Montana"),
    ("NE", "31", "Nebraska"),
    ("NV", "32", "Nevada"),
    ("NH", "33", "New Hampshire"),
    ("NJ", "34", "New Jersey"),
    ("NM", "35", "New Mexico"),
    ("NY", "36", "New York"),
    ("NC", "37", "North Carolina"),
    ("ND", "38", "North Dakota"),
    ("OH", "39", "Ohio"),
    ("OK", "40", "Oklahoma"),
    ("OR", "41", "Oregon"),
    ("PA", "42", "Pennsylvania"),
    ("RI", "44", "Rhode Island"),
    ("SC", "45", "South Carolina"),
    ("SD", "46", "South Dakota"),
    ("TN", "47", "Tennessee"),
    ("TX", "48", "Texas"),
    ("UT", "49", "Utah"),
    ("VT", "50", "Vermont"),
    ("VA", "51", "Virginia"),
    ("WA", "53", "Washington"),
    ("WV", "54", "West Virginia"),
    ("WI", "55", "Wisconsin"),
    ("WY", "56", "Wyoming"),
    ("AS", "60", "American Samoa"),
    ("GU", "66", "Guam"),
    ("MP", "69", "Northern Mariana Islands"),
    ("PR", "72", "Puerto Rico"),
    ("VI", "78", "U.S. Virgin Islands"),
];

/// Returns the FIPS code for a postal abbreviation (case-insensitive).
///
/// # Examples
///
/// ```
/// use tiger_fetch::states::fips_code;
///
/// assert_eq!(fips_code("or"), Some("41"));
/// assert_eq!(fips_code("XX"), None);
/// ```
#[must_use]
pub fn fips_code(abbreviation: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(abbrev, _, _)| abbrev.eq_ignore_ascii_case(abbreviation))
        .map(|(_, fips, _)| *fips)
}

/// Returns the full name for a postal abbreviation (case-insensitive).
#[must_use]
pub fn state_name(abbreviation: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(abbrev, _, _)| abbrev.eq_ignore_ascii_case(abbreviation))
        .map(|(_, _, name)| *name)
}

/// All known postal abbreviations, in FIPS order.
#[must_use]
pub fn get_state_abbreviations() -> Vec<&'static str> {
    STATES.iter().map(|(abbrev, _, _)| *abbrev).collect()
}
