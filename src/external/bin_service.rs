use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

use crate::{
    api::BinAPI,
    entities::{Bin, BinPatch, Coordinates, NewBin},
    error::{invalid_input_error, upstream_error, Error},
};

/// Wire format of the repository backend. `image` comes back as an empty
/// string when no photo is attached; `note` and `route` are nullable.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct BinRecord {
    id: i64,
    lat: f64,
    lng: f64,
    note: Option<String>,
    image: Option<String>,
    route: Option<String>,
}

impl From<BinRecord> for Bin {
    fn from(record: BinRecord) -> Self {
        Bin {
            id: record.id,
            location: Coordinates::new(record.lat, record.lng),
            note: record.note.unwrap_or_default(),
            route: record.route.unwrap_or_default(),
            image: record.image.filter(|image| !image.is_empty()),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct Ack {
    message: String,
}

fn service_url(path: &str) -> Result<String, Error> {
    let base = env::var("BIN_SERVICE_BASE")?;

    Ok(format!("https://{}{}", base, path))
}

fn check_status(status_code: u16) -> Result<(), Error> {
    if status_code >= 400 && status_code < 500 {
        return Err(invalid_input_error());
    } else if status_code != 200 {
        return Err(upstream_error());
    }

    Ok(())
}

/// Reqwest-backed client for the bin repository service.
#[derive(Debug)]
pub struct BinService;

#[async_trait]
impl BinAPI for BinService {
    #[tracing::instrument]
    async fn find_bins(&self, route: &str) -> Result<Vec<Bin>, Error> {
        let url = service_url("/get_bins")?;

        let res = reqwest::Client::new()
            .get(url)
            .query(&[("route", route)])
            .send()
            .await?;

        check_status(res.status().as_u16())?;

        let records: Vec<BinRecord> = res.json().await?;

        Ok(records.into_iter().map(Bin::from).collect())
    }

    #[tracing::instrument]
    async fn create_bin(&self, bin: NewBin) -> Result<(), Error> {
        let url = service_url("/add_bin")?;

        let res = reqwest::Client::new()
            .post(url)
            .form(&[
                ("lat", bin.location.latitude.to_string()),
                ("lng", bin.location.longitude.to_string()),
                ("note", bin.note),
                ("route", bin.route),
            ])
            .send()
            .await?;

        check_status(res.status().as_u16())?;

        let ack: Ack = res.json().await?;
        tracing::info!(message = %ack.message, "bin saved");

        Ok(())
    }

    #[tracing::instrument]
    async fn update_bin(&self, id: i64, patch: BinPatch) -> Result<(), Error> {
        let url = service_url(&format!("/edit_bin/{}", id))?;

        // Only fields being changed go on the wire; the backend keeps the
        // rest as-is.
        let mut fields: Vec<(&str, String)> = vec![];
        if let Some(note) = patch.note {
            fields.push(("note", note));
        }
        if let Some(route) = patch.route {
            fields.push(("route", route));
        }

        let res = reqwest::Client::new()
            .post(url)
            .form(&fields)
            .send()
            .await?;

        check_status(res.status().as_u16())?;

        let ack: Ack = res.json().await?;
        tracing::info!(message = %ack.message, "bin updated");

        Ok(())
    }

    #[tracing::instrument]
    async fn delete_bin(&self, id: i64) -> Result<(), Error> {
        let url = service_url(&format!("/delete_bin/{}", id))?;

        let res = reqwest::Client::new().delete(url).send().await?;

        check_status(res.status().as_u16())?;

        let ack: Ack = res.json().await?;
        tracing::info!(message = %ack.message, "bin deleted");

        Ok(())
    }
}

#[test]
fn bin_record_normalizes_empty_image_and_null_note() {
    let record: BinRecord = serde_json::from_str(
        r#"{"id": 3, "lat": 44.66, "lng": -63.62, "note": null, "image": "", "route": "route1"}"#,
    )
    .unwrap();

    let bin = Bin::from(record);

    assert_eq!(bin.id, 3);
    assert_eq!(bin.note, "");
    assert_eq!(bin.route, "route1");
    assert_eq!(bin.image, None);
    assert_eq!(bin.location, Coordinates::new(44.66, -63.62));
}

#[test]
fn bin_record_keeps_photo_reference() {
    let record: BinRecord = serde_json::from_str(
        r#"{"id": 4, "lat": 44.66, "lng": -63.62, "note": "curb side", "image": "/uploads/bin4.jpg", "route": null}"#,
    )
    .unwrap();

    let bin = Bin::from(record);

    assert_eq!(bin.note, "curb side");
    assert_eq!(bin.route, "");
    assert_eq!(bin.image.as_deref(), Some("/uploads/bin4.jpg"));
}

#[test]
fn client_errors_map_to_invalid_input() {
    assert_eq!(check_status(200).err().map(|e| e.code), None);
    assert_eq!(check_status(404).unwrap_err().code, 101);
    assert_eq!(check_status(500).unwrap_err().code, 4);
}
