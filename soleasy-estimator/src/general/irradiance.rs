use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Reader, open_workbook_auto};
use indexmap::IndexMap;
use soleasy_model::projection::IrradianceSource;
use tracing::info;

/// Average daily equivalent sun-hours per Italian province: (code, name, hours).
///
/// Values are regional averages of the yearly specific yield of a south-facing
/// array, divided by 365.
const ITALIAN_PROVINCES: &[(&str, &str, f64)] = &[
    // Piemonte
    ("TO", "Torino", 3.6),
    ("VC", "Vercelli", 3.6),
    ("NO", "Novara", 3.6),
    ("CN", "Cuneo", 3.6),
    ("AT", "Asti", 3.6),
    ("AL", "Alessandria", 3.6),
    ("BI", "Biella", 3.6),
    ("VB", "Verbano-Cusio-Ossola", 3.6),
    // Valle d'Aosta
    ("AO", "Aosta", 3.5),
    // Lombardia
    ("VA", "Varese", 3.5),
    ("CO", "Como", 3.5),
    ("SO", "Sondrio", 3.5),
    ("MI", "Milano", 3.5),
    ("BG", "Bergamo", 3.5),
    ("BS", "Brescia", 3.5),
    ("PV", "Pavia", 3.5),
    ("CR", "Cremona", 3.5),
    ("MN", "Mantova", 3.5),
    ("LC", "Lecco", 3.5),
    ("LO", "Lodi", 3.5),
    ("MB", "Monza e della Brianza", 3.5),
    // Trentino-Alto Adige
    ("BZ", "Bolzano", 3.6),
    ("TN", "Trento", 3.6),
    // Veneto
    ("VR", "Verona", 3.6),
    ("VI", "Vicenza", 3.6),
    ("BL", "Belluno", 3.6),
    ("TV", "Treviso", 3.6),
    ("VE", "Venezia", 3.6),
    ("PD", "Padova", 3.6),
    ("RO", "Rovigo", 3.6),
    // Friuli-Venezia Giulia
    ("UD", "Udine", 3.5),
    ("GO", "Gorizia", 3.5),
    ("TS", "Trieste", 3.5),
    ("PN", "Pordenone", 3.5),
    // Liguria
    ("IM", "Imperia", 3.9),
    ("SV", "Savona", 3.9),
    ("GE", "Genova", 3.9),
    ("SP", "La Spezia", 3.9),
    // Emilia-Romagna
    ("PC", "Piacenza", 3.8),
    ("PR", "Parma", 3.8),
    ("RE", "Reggio Emilia", 3.8),
    ("MO", "Modena", 3.8),
    ("BO", "Bologna", 3.8),
    ("FE", "Ferrara", 3.8),
    ("RA", "Ravenna", 3.8),
    ("FC", "Forlì-Cesena", 3.8),
    ("RN", "Rimini", 3.8),
    // Toscana
    ("MS", "Massa-Carrara", 4.1),
    ("LU", "Lucca", 4.1),
    ("PT", "Pistoia", 4.1),
    ("FI", "Firenze", 4.1),
    ("LI", "Livorno", 4.1),
    ("PI", "Pisa", 4.1),
    ("AR", "Arezzo", 4.1),
    ("SI", "Siena", 4.1),
    ("GR", "Grosseto", 4.1),
    ("PO", "Prato", 4.1),
    // Umbria
    ("PG", "Perugia", 4.1),
    ("TR", "Terni", 4.1),
    // Marche
    ("PU", "Pesaro e Urbino", 4.1),
    ("AN", "Ancona", 4.1),
    ("MC", "Macerata", 4.1),
    ("AP", "Ascoli Piceno", 4.1),
    ("FM", "Fermo", 4.1),
    // Lazio
    ("VT", "Viterbo", 4.5),
    ("RI", "Rieti", 4.5),
    ("RM", "Roma", 4.5),
    ("LT", "Latina", 4.5),
    ("FR", "Frosinone", 4.5),
    // Abruzzo
    ("AQ", "L'Aquila", 4.2),
    ("TE", "Teramo", 4.2),
    ("PE", "Pescara", 4.2),
    ("CH", "Chieti", 4.2),
    // Molise
    ("CB", "Campobasso", 4.3),
    ("IS", "Isernia", 4.3),
    // Campania
    ("CE", "Caserta", 4.6),
    ("BN", "Benevento", 4.6),
    ("NA", "Napoli", 4.6),
    ("AV", "Avellino", 4.6),
    ("SA", "Salerno", 4.6),
    // Puglia
    ("FG", "Foggia", 4.8),
    ("BA", "Bari", 4.8),
    ("TA", "Taranto", 4.8),
    ("BR", "Brindisi", 4.8),
    ("LE", "Lecce", 4.8),
    ("BT", "Barletta-Andria-Trani", 4.8),
    // Basilicata
    ("PZ", "Potenza", 4.6),
    ("MT", "Matera", 4.6),
    // Calabria
    ("CS", "Cosenza", 4.8),
    ("CZ", "Catanzaro", 4.8),
    ("RC", "Reggio Calabria", 4.8),
    ("KR", "Crotone", 4.8),
    ("VV", "Vibo Valentia", 4.8),
    // Sicilia
    ("TP", "Trapani", 5.0),
    ("PA", "Palermo", 5.0),
    ("ME", "Messina", 5.0),
    ("AG", "Agrigento", 5.0),
    ("CL", "Caltanissetta", 5.0),
    ("EN", "Enna", 5.0),
    ("CT", "Catania", 5.0),
    ("RG", "Ragusa", 5.0),
    ("SR", "Siracusa", 5.0),
    // Sardegna
    ("SS", "Sassari", 4.9),
    ("NU", "Nuoro", 4.9),
    ("CA", "Cagliari", 4.9),
    ("OR", "Oristano", 4.9),
    ("SU", "Sud Sardegna", 4.9),
];

/// Result of resolving a province against the table.
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceLookup {
    /// Normalised province key the lookup ended on.
    pub province: String,
    pub hours_per_day: f64,
    pub source: IrradianceSource,
}

/// Province to average daily equivalent sun-hours.
///
/// Keys are upper-case province codes; full province names resolve through a
/// secondary alias index.
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceTable {
    hours: IndexMap<String, f64>,
    aliases: IndexMap<String, String>,
}

impl IrradianceTable {
    /// Built-in table covering every Italian province.
    pub fn italian_provinces() -> Self {
        let mut table = Self::empty();
        for &(code, name, hours) in ITALIAN_PROVINCES {
            table.insert(code, hours);
            table.insert_alias(name, code);
        }
        table
    }

    pub fn empty() -> Self {
        Self {
            hours: IndexMap::new(),
            aliases: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, province: &str, hours_per_day: f64) {
        self.hours.insert(normalize_province(province), hours_per_day);
    }

    /// Makes `name` resolve to the entry stored under `province`.
    pub fn insert_alias(&mut self, name: &str, province: &str) {
        self.aliases
            .insert(normalize_province(name), normalize_province(province));
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    /// Exact lookup by province code, then by province name.
    pub fn get(&self, province: &str) -> Option<f64> {
        let key = normalize_province(province);
        self.hours.get(&key).copied().or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|code| self.hours.get(code))
                .copied()
        })
    }

    /// Looks the province up, using `fallback_hours` when it is not mapped.
    ///
    /// An unmapped province costs regional precision but never the estimate.
    pub fn resolve(&self, province: &str, fallback_hours: f64) -> IrradianceLookup {
        let key = normalize_province(province);
        match self.get(&key) {
            Some(hours_per_day) => IrradianceLookup {
                province: key,
                hours_per_day,
                source: IrradianceSource::Table,
            },
            None => IrradianceLookup {
                province: key,
                hours_per_day: fallback_hours,
                source: IrradianceSource::Fallback,
            },
        }
    }

    /// Loads a table from a `.csv` or `.xlsx`/`.xls`/`.ods` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let table = match extension.as_deref() {
            Some("csv") => Self::load_csv(path)?,
            Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => Self::load_workbook(path)?,
            _ => bail!(
                "Unsupported irradiance table format: {} (expected .csv or .xlsx)",
                path.display()
            ),
        };

        info!(path = %path.display(), provinces = table.len(), "loaded irradiance table");
        Ok(table)
    }

    /// Loads a table from CSV.
    ///
    /// Expected format: `province,hours[,name]` with a header line. Decimal
    /// commas are accepted when the value is quoted.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open irradiance table: {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut table = Self::empty();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            // Skip header line
            if line_num == 0 || line.trim().is_empty() {
                continue;
            }

            let parts = split_csv_line(&line);
            if parts.len() < 2 {
                bail!(
                    "Invalid CSV format on line {}: '{}'. Expected province,hours[,name]",
                    line_num + 1,
                    line
                );
            }

            let hours = parse_hours(&parts[1])
                .with_context(|| format!("Invalid sun-hours on line {}", line_num + 1))?;
            table.insert(&parts[0], hours);
            if let Some(name) = parts.get(2).filter(|name| !name.is_empty()) {
                table.insert_alias(name, &parts[0]);
            }
        }

        if table.is_empty() {
            bail!("Irradiance table {} has no rows", path.display());
        }
        Ok(table)
    }

    /// Loads a table from the first worksheet of a spreadsheet, same columns as the CSV.
    pub fn load_workbook(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open irradiance workbook: {}", path.display()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("Workbook {} has no worksheet", path.display()))?
            .with_context(|| format!("Failed to read first worksheet of {}", path.display()))?;

        let mut table = Self::empty();
        for (row_num, row) in range.rows().enumerate().skip(1) {
            let province = row.first().and_then(cell_text);
            let Some(province) = province.filter(|province| !province.is_empty()) else {
                continue;
            };

            let hours = match row.get(1) {
                Some(Data::Float(value)) => check_hours(*value),
                Some(Data::Int(value)) => check_hours(*value as f64),
                Some(Data::String(value)) => parse_hours(value),
                _ => Err(anyhow!("missing value")),
            }
            .with_context(|| format!("Invalid sun-hours on row {}", row_num + 1))?;

            table.insert(&province, hours);
            if let Some(name) = row.get(2).and_then(cell_text).filter(|name| !name.is_empty()) {
                table.insert_alias(&name, &province);
            }
        }

        if table.is_empty() {
            bail!("Irradiance workbook {} has no rows", path.display());
        }
        Ok(table)
    }
}

impl Default for IrradianceTable {
    fn default() -> Self {
        Self::italian_provinces()
    }
}

/// Canonical lookup key for a province as printed on a bill.
///
/// Upper-cases and trims, drops a leading "Provincia:"/"Prov." label and
/// prefers a parenthesised code, so "Roma (RM)" and "Provincia: RM" both
/// become "RM".
pub fn normalize_province(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();

    if let (Some(open), Some(close)) = (upper.rfind('('), upper.rfind(')'))
        && open < close
    {
        let inner = upper[open + 1..close].trim();
        if !inner.is_empty() {
            return inner.to_string();
        }
    }

    let without_label = upper
        .strip_prefix("PROVINCIA")
        .or_else(|| upper.strip_prefix("PROV."))
        .map(|rest| rest.trim_start_matches([':', '.', ' ']))
        .unwrap_or(&upper);

    without_label.trim().to_string()
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => parts.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

fn parse_hours(raw: &str) -> Result<f64> {
    let value = raw
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .with_context(|| format!("could not parse '{}'", raw))?;
    check_hours(value)
}

fn check_hours(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(anyhow!("sun-hours must be a positive number, got {}", value))
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(value) => Some(value.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_covers_every_province() {
        let table = IrradianceTable::default();
        assert_eq!(table.len(), 107);
        assert_eq!(table.get("RM"), Some(4.5));
        assert_eq!(table.get("MI"), Some(3.5));
        assert_eq!(table.get("PA"), Some(5.0));
    }

    #[test]
    fn test_lookup_by_name_and_label() {
        let table = IrradianceTable::default();
        assert_eq!(table.get("Roma"), Some(4.5));
        assert_eq!(table.get(" rm "), Some(4.5));
        assert_eq!(table.get("Roma (RM)"), Some(4.5));
        assert_eq!(table.get("Provincia: RM"), Some(4.5));
        assert_eq!(table.get("L'Aquila"), Some(4.2));
        assert_eq!(table.get("forlì-cesena"), Some(3.8));
    }

    #[test]
    fn test_resolve_falls_back_for_unmapped_province() {
        let table = IrradianceTable::default();

        let found = table.resolve("RM", 4.0);
        assert_eq!(found.hours_per_day, 4.5);
        assert_eq!(found.source, IrradianceSource::Table);

        let missing = table.resolve("Atlantis", 4.0);
        assert_eq!(missing.province, "ATLANTIS");
        assert_eq!(missing.hours_per_day, 4.0);
        assert_eq!(missing.source, IrradianceSource::Fallback);
    }

    #[test]
    fn test_normalize_province() {
        assert_eq!(normalize_province("Roma (RM)"), "RM");
        assert_eq!(normalize_province("Provincia: mi"), "MI");
        assert_eq!(normalize_province("Prov. TO"), "TO");
        assert_eq!(normalize_province("  Napoli "), "NAPOLI");
        assert_eq!(normalize_province("()"), "()");
    }

    #[test]
    fn test_load_csv() {
        let test_data = "province,hours,name\nRM,4.5,Roma\nMI,\"3,4\",Milano\nXX,2.0\n";
        let temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        std::fs::write(&temp_file, test_data).unwrap();

        let table = IrradianceTable::load(temp_file.path()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("Roma"), Some(4.5));
        assert_eq!(table.get("Milano"), Some(3.4));
        assert_eq!(table.get("xx"), Some(2.0));
        assert_eq!(table.get("NA"), None);
    }

    #[test]
    fn test_load_csv_rejects_bad_rows() {
        let temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();

        std::fs::write(&temp_file, "province,hours\nRM,sunny\n").unwrap();
        let err = IrradianceTable::load_csv(temp_file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));

        std::fs::write(&temp_file, "province,hours\nRM,-1\n").unwrap();
        assert!(IrradianceTable::load_csv(temp_file.path()).is_err());

        std::fs::write(&temp_file, "province,hours\nRM\n").unwrap();
        assert!(IrradianceTable::load_csv(temp_file.path()).is_err());

        std::fs::write(&temp_file, "province,hours\n").unwrap();
        assert!(IrradianceTable::load_csv(temp_file.path()).is_err());
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn test_load_workbook() {
        let table = IrradianceTable::load(fixture("irradiance.xlsx")).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("RM"), Some(4.5));
        // Text cell with a decimal comma
        assert_eq!(table.get("MI"), Some(3.5));
        assert_eq!(table.get("BZ"), Some(4.0));
        assert_eq!(table.get("Bolzano"), Some(4.0));
        assert_eq!(table.get("Roma (RM)"), Some(4.5));
        // Header row is not data
        assert_eq!(table.get("province"), None);
    }

    #[test]
    fn test_load_workbook_reports_bad_row() {
        let err = IrradianceTable::load_workbook(fixture("irradiance_bad_hours.xlsx")).unwrap_err();
        assert!(format!("{:#}", err).contains("row 3"), "{:#}", err);
    }

    #[test]
    fn test_load_workbook_without_rows() {
        let err = IrradianceTable::load_workbook(fixture("irradiance_empty.xlsx")).unwrap_err();
        assert!(format!("{:#}", err).contains("has no rows"), "{:#}", err);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let temp_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        assert!(IrradianceTable::load(temp_file.path()).is_err());
    }
}
