//! Writes a synthetic incident dataset (`sample_incidents.csv` and
//! `sample_incidents.parquet`) in the GTD column layout, for offline use.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ROWS: usize = 5000;

/// (country, region, city, lat, lon)
const PLACES: [(&str, &str, &str, f64, f64); 10] = [
    ("Iraq", "Middle East & North Africa", "Baghdad", 33.3, 44.4),
    ("Syria", "Middle East & North Africa", "Aleppo", 36.2, 37.1),
    ("Afghanistan", "South Asia", "Kabul", 34.5, 69.2),
    ("India", "South Asia", "Mumbai", 19.0, 72.8),
    ("Pakistan", "South Asia", "Karachi", 24.9, 67.0),
    ("Nigeria", "Sub-Saharan Africa", "Maiduguri", 11.8, 13.2),
    ("Somalia", "Sub-Saharan Africa", "Mogadishu", 2.0, 45.3),
    ("Colombia", "South America", "Bogota", 4.7, -74.1),
    ("Philippines", "Southeast Asia", "Manila", 14.6, 121.0),
    ("United Kingdom", "Western Europe", "Belfast", 54.6, -5.9),
];

/// (attack type, weapon type)
const ATTACKS: [(&str, &str); 6] = [
    ("Bombing/Explosion", "Explosives"),
    ("Armed Assault", "Firearms"),
    ("Assassination", "Firearms"),
    ("Hostage Taking (Kidnapping)", "Firearms"),
    ("Facility/Infrastructure Attack", "Incendiary"),
    ("Unknown", "Unknown"),
];

const TARGETS: [&str; 6] = [
    "Private Citizens & Property",
    "Military",
    "Police",
    "Government (General)",
    "Business",
    "Religious Figures/Institutions",
];

const GROUPS: [&str; 8] = [
    "Unknown",
    "Taliban",
    "Islamic State of Iraq and the Levant (ISIL)",
    "Boko Haram",
    "Al-Shabaab",
    "Revolutionary Armed Forces of Colombia (FARC)",
    "New People's Army (NPA)",
    "Irish Republican Army (IRA)",
];

struct Columns {
    eventid: Vec<i64>,
    iyear: Vec<i64>,
    imonth: Vec<i64>,
    iday: Vec<i64>,
    country: Vec<&'static str>,
    region: Vec<&'static str>,
    city: Vec<&'static str>,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    attack: Vec<&'static str>,
    target: Vec<&'static str>,
    weapon: Vec<&'static str>,
    gname: Vec<&'static str>,
    nkill: Vec<Option<f64>>,
    nwound: Vec<Option<f64>>,
    success: Vec<i64>,
    suicide: Vec<i64>,
}

fn generate(rng: &mut StdRng) -> Columns {
    let mut c = Columns {
        eventid: Vec::with_capacity(ROWS),
        iyear: Vec::with_capacity(ROWS),
        imonth: Vec::with_capacity(ROWS),
        iday: Vec::with_capacity(ROWS),
        country: Vec::with_capacity(ROWS),
        region: Vec::with_capacity(ROWS),
        city: Vec::with_capacity(ROWS),
        latitude: Vec::with_capacity(ROWS),
        longitude: Vec::with_capacity(ROWS),
        attack: Vec::with_capacity(ROWS),
        target: Vec::with_capacity(ROWS),
        weapon: Vec::with_capacity(ROWS),
        gname: Vec::with_capacity(ROWS),
        nkill: Vec::with_capacity(ROWS),
        nwound: Vec::with_capacity(ROWS),
        success: Vec::with_capacity(ROWS),
        suicide: Vec::with_capacity(ROWS),
    };

    for i in 0..ROWS {
        let year = rng.gen_range(1970..=2019);
        // Roughly 2% of records carry an unknown month or day, as in the GTD.
        let month = if rng.gen_bool(0.02) { 0 } else { rng.gen_range(1..=12) };
        let day = if rng.gen_bool(0.02) { 0 } else { rng.gen_range(1..=28) };
        let (country, region, city, lat, lon) = PLACES[rng.gen_range(0..PLACES.len())];
        let (attack, weapon) = ATTACKS[rng.gen_range(0..ATTACKS.len())];

        // Heavy-tailed casualty counts, occasionally unrecorded.
        let kill = (rng.gen::<f64>().powi(6) * 300.0).floor();
        let wound = (rng.gen::<f64>().powi(5) * 500.0).floor();

        c.eventid.push(year * 100_000_000 + i as i64);
        c.iyear.push(year);
        c.imonth.push(month);
        c.iday.push(day);
        c.country.push(country);
        c.region.push(region);
        c.city.push(city);
        c.latitude.push(lat + rng.gen_range(-1.5..1.5));
        c.longitude.push(lon + rng.gen_range(-1.5..1.5));
        c.attack.push(attack);
        c.target.push(TARGETS[rng.gen_range(0..TARGETS.len())]);
        c.weapon.push(weapon);
        c.gname.push(GROUPS[rng.gen_range(0..GROUPS.len())]);
        c.nkill.push((!rng.gen_bool(0.05)).then_some(kill));
        c.nwound.push((!rng.gen_bool(0.08)).then_some(wound));
        c.success.push(i64::from(rng.gen_bool(0.9)));
        c.suicide.push(i64::from(rng.gen_bool(0.04)));
    }
    c
}

fn write_csv(c: &Columns, path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "eventid", "iyear", "imonth", "iday", "country_txt", "region_txt", "city", "latitude",
        "longitude", "attacktype1_txt", "targtype1_txt", "weaptype1_txt", "gname", "nkill",
        "nwound", "success", "suicide",
    ])?;

    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for i in 0..c.eventid.len() {
        writer.write_record([
            c.eventid[i].to_string(),
            c.iyear[i].to_string(),
            c.imonth[i].to_string(),
            c.iday[i].to_string(),
            c.country[i].to_string(),
            c.region[i].to_string(),
            c.city[i].to_string(),
            format!("{:.4}", c.latitude[i]),
            format!("{:.4}", c.longitude[i]),
            c.attack[i].to_string(),
            c.target[i].to_string(),
            c.weapon[i].to_string(),
            c.gname[i].to_string(),
            opt(c.nkill[i]),
            opt(c.nwound[i]),
            c.success[i].to_string(),
            c.suicide[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(c: &Columns, path: &str) -> Result<()> {
    let text = |name: &str| Field::new(name, DataType::Utf8, false);
    let int = |name: &str| Field::new(name, DataType::Int64, false);
    let schema = Arc::new(Schema::new(vec![
        int("eventid"),
        int("iyear"),
        int("imonth"),
        int("iday"),
        text("country_txt"),
        text("region_txt"),
        text("city"),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        text("attacktype1_txt"),
        text("targtype1_txt"),
        text("weaptype1_txt"),
        text("gname"),
        Field::new("nkill", DataType::Float64, true),
        Field::new("nwound", DataType::Float64, true),
        int("success"),
        int("suicide"),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(c.eventid.clone())),
        Arc::new(Int64Array::from(c.iyear.clone())),
        Arc::new(Int64Array::from(c.imonth.clone())),
        Arc::new(Int64Array::from(c.iday.clone())),
        Arc::new(StringArray::from(c.country.clone())),
        Arc::new(StringArray::from(c.region.clone())),
        Arc::new(StringArray::from(c.city.clone())),
        Arc::new(Float64Array::from(c.latitude.clone())),
        Arc::new(Float64Array::from(c.longitude.clone())),
        Arc::new(StringArray::from(c.attack.clone())),
        Arc::new(StringArray::from(c.target.clone())),
        Arc::new(StringArray::from(c.weapon.clone())),
        Arc::new(StringArray::from(c.gname.clone())),
        Arc::new(Float64Array::from(c.nkill.clone())),
        Arc::new(Float64Array::from(c.nwound.clone())),
        Arc::new(Int64Array::from(c.success.clone())),
        Arc::new(Int64Array::from(c.suicide.clone())),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let columns = generate(&mut rng);

    write_csv(&columns, "sample_incidents.csv")?;
    write_parquet(&columns, "sample_incidents.parquet")?;

    println!("Wrote {ROWS} incidents to sample_incidents.csv and sample_incidents.parquet");
    Ok(())
}
