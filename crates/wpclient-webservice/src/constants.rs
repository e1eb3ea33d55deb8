//! Webservice method names and wire constants.
//!
//! Keep these stable; they are part of the public WikiPathways webservice contract.

pub const GET_PATHWAY: &str = "getPathway";
pub const GET_PATHWAY_INFO: &str = "getPathwayInfo";
pub const LIST_PATHWAYS: &str = "listPathways";
pub const LIST_ORGANISMS: &str = "listOrganisms";
pub const FIND_BY_TEXT: &str = "findPathwaysByText";
pub const FIND_BY_XREF: &str = "findPathwaysByXref";
pub const FIND_BY_LITERATURE: &str = "findPathwaysByLiterature";
pub const GET_CURATION_TAGS: &str = "getCurationTags";
pub const GET_CURATION_TAGS_BY_NAME: &str = "getCurationTagsByName";
pub const GET_XREF_LIST: &str = "getXrefList";
pub const LOGIN: &str = "login";
pub const CREATE_PATHWAY: &str = "createPathway";
pub const UPDATE_PATHWAY: &str = "updatePathway";
pub const SAVE_CURATION_TAG: &str = "saveCurationTag";

/// Query parameter selecting the JSON response format.
pub const FORMAT_PARAM: (&str, &str) = ("format", "json");

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("wpclient/", env!("CARGO_PKG_VERSION"));

/// Database names and the system codes the webservice expects for them.
///
/// Lookups are case-insensitive; names not listed are sent as-is.
const SYSTEM_CODES: &[(&str, &str)] = &[
    ("Affy", "X"),
    ("CAS", "Ca"),
    ("ChEBI", "Ce"),
    ("ChemSpider", "Cs"),
    ("Ensembl", "En"),
    ("Entrez Gene", "L"),
    ("HGNC", "H"),
    ("HMDB", "Ch"),
    ("KEGG Compound", "Ck"),
    ("KEGG Genes", "Kg"),
    ("PubChem-compound", "Cpc"),
    ("RefSeq", "Q"),
    ("Uniprot-TrEMBL", "S"),
    ("Wikidata", "Wd"),
];

/// System code for a database name.
pub fn system_code(namespace: &str) -> &str {
    let ns = namespace.trim();
    SYSTEM_CODES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(ns))
        .map(|(_, code)| *code)
        .unwrap_or(ns)
}
