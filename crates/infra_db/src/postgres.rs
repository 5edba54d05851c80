//! PostgreSQL store
//!
//! `PgStore` implements every clinic port on a SQLx connection pool. Queries
//! are built at runtime and decoded through `FromRow` row structs, which are
//! converted into domain types here so that no SQL type leaks into the
//! domain crates.
//!
//! # Guarded medicine writes
//!
//! Every write to an existing medicine is
//!
//! ```sql
//! UPDATE medicines SET ..., version = version + 1
//! WHERE id = $1 AND version = $2
//! ```
//!
//! and zero affected rows means another writer moved the version first. Bill
//! creation and deletion run their bill, medicine and patient statements in
//! one transaction, so a stale medicine rolls back the whole change set.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{Executor, FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, BillId, Currency, DomainPort, HealthCheckResult, HealthCheckable, MedicineId,
    Money, PatientId, PortError, SequenceKind, SequencePort, ServiceId,
};
use domain_billing::{
    Bill, BillCommit, BillDeletion, BillPort, BillQuery, MedicineLine, MedicineWrite,
    PaymentMethod, PaymentStatus, ServiceLine,
};
use domain_catalog::{CatalogPort, ServiceItem, ServiceQuery};
use domain_inventory::{Medicine, MedicinePort, MedicineQuery, MedicineStatus};
use domain_patient::{Patient, PatientPort, PatientQuery, Visit};

use crate::error::DatabaseError;

const PATIENT_COLUMNS: &str = "id, code, name, age, gender, phone, email, address, blood_group, \
     medical_history, allergies, status, last_visit, visits, created_at, updated_at";

const MEDICINE_COLUMNS: &str = "id, code, name, generic_name, category, manufacturer, batch_number, \
     description, currency, buying_price, selling_price, stock, min_stock_level, expiry_date, \
     status, version, created_at, updated_at";

const SERVICE_COLUMNS: &str =
    "id, code, name, description, category, currency, price, duration, is_active, created_at, updated_at";

const BILL_COLUMNS: &str = "id, code, patient_id, patient_name, patient_phone, currency, \
     consultation_fee, medicines, services, medicines_total, services_total, total_amount, \
     payment_status, payment_method, notes, created_at, updated_at";

/// Numeric part of `code`, so `BILL1000` sorts after `BILL999`
const CODE_NUMBER: &str = "COALESCE(substring(code FROM '[0-9]+$')::BIGINT, 0)";

/// PostgreSQL-backed implementation of every clinic port
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store on an already migrated pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PgStore {}

#[async_trait]
impl HealthCheckable for PgStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, FromRow)]
struct PatientRow {
    id: Uuid,
    code: String,
    name: String,
    age: i32,
    gender: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    blood_group: Option<String>,
    medical_history: Json<Vec<String>>,
    allergies: Json<Vec<String>>,
    status: String,
    last_visit: Option<DateTime<Utc>>,
    visits: Json<Vec<Visit>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = DatabaseError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(Patient {
            id: PatientId::from(row.id),
            code: row.code,
            name: row.name,
            age: to_u32(row.age, "age")?,
            gender: parse_enum(&row.gender)?,
            phone: row.phone,
            email: row.email,
            address: row.address,
            blood_group: row.blood_group,
            medical_history: row.medical_history.0,
            allergies: row.allergies.0,
            status: parse_enum(&row.status)?,
            last_visit: row.last_visit,
            visits: row.visits.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MedicineRow {
    id: Uuid,
    code: String,
    name: String,
    generic_name: Option<String>,
    category: String,
    manufacturer: Option<String>,
    batch_number: Option<String>,
    description: Option<String>,
    currency: String,
    buying_price: Decimal,
    selling_price: Decimal,
    stock: i32,
    min_stock_level: i32,
    expiry_date: NaiveDate,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MedicineRow> for Medicine {
    type Error = DatabaseError;

    fn try_from(row: MedicineRow) -> Result<Self, Self::Error> {
        let currency = currency_of(&row.currency)?;
        let status = MedicineStatus::parse(&row.status).ok_or_else(|| {
            DatabaseError::SerializationError(format!("unknown medicine status '{}'", row.status))
        })?;
        Ok(Medicine {
            id: MedicineId::from(row.id),
            code: row.code,
            name: row.name,
            generic_name: row.generic_name,
            category: row.category,
            manufacturer: row.manufacturer,
            batch_number: row.batch_number,
            description: row.description,
            buying_price: Money::new(row.buying_price, currency),
            selling_price: Money::new(row.selling_price, currency),
            stock: to_u32(row.stock, "stock")?,
            min_stock_level: to_u32(row.min_stock_level, "min_stock_level")?,
            expiry_date: row.expiry_date,
            status,
            version: u64::try_from(row.version).map_err(|_| {
                DatabaseError::SerializationError(format!("negative version {}", row.version))
            })?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ServiceRow {
    id: Uuid,
    code: String,
    name: String,
    description: Option<String>,
    category: String,
    currency: String,
    price: Decimal,
    duration: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ServiceRow> for ServiceItem {
    type Error = DatabaseError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Ok(ServiceItem {
            id: ServiceId::from(row.id),
            code: row.code,
            name: row.name,
            description: row.description,
            category: row.category,
            price: Money::new(row.price, currency_of(&row.currency)?),
            duration: row.duration,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct BillRow {
    id: Uuid,
    code: String,
    patient_id: Uuid,
    patient_name: String,
    patient_phone: String,
    currency: String,
    consultation_fee: Decimal,
    medicines: Json<Vec<MedicineLine>>,
    services: Json<Vec<ServiceLine>>,
    medicines_total: Decimal,
    services_total: Decimal,
    total_amount: Decimal,
    payment_status: String,
    payment_method: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BillRow> for Bill {
    type Error = DatabaseError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let currency = currency_of(&row.currency)?;
        let payment_status = row
            .payment_status
            .parse::<PaymentStatus>()
            .map_err(DatabaseError::SerializationError)?;
        let payment_method = row
            .payment_method
            .as_deref()
            .map(str::parse::<PaymentMethod>)
            .transpose()
            .map_err(DatabaseError::SerializationError)?;
        Ok(Bill {
            id: BillId::from(row.id),
            code: row.code,
            patient: PatientId::from(row.patient_id),
            patient_name: row.patient_name,
            patient_phone: row.patient_phone,
            consultation_fee: Money::new(row.consultation_fee, currency),
            medicines: row.medicines.0,
            services: row.services.0,
            medicines_total: Money::new(row.medicines_total, currency),
            services_total: Money::new(row.services_total, currency),
            total_amount: Money::new(row.total_amount, currency),
            payment_status,
            payment_method,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Conversion helpers
// =============================================================================

fn db(error: sqlx::Error) -> PortError {
    DatabaseError::from(error).into()
}

/// Maps a unique violation on insert to a duplicate of `code`
fn duplicate_code<'a>(entity: &'a str, code: &'a str) -> impl FnOnce(sqlx::Error) -> PortError + 'a {
    move |error| match DatabaseError::from(error) {
        DatabaseError::DuplicateEntry(_) => PortError::duplicate(format!("{entity} code"), code),
        other => other.into(),
    }
}

fn currency_of(code: &str) -> Result<Currency, DatabaseError> {
    code.parse()
        .map_err(|e: core_kernel::MoneyError| DatabaseError::SerializationError(e.to_string()))
}

fn to_u32(value: i32, field: &str) -> Result<u32, DatabaseError> {
    u32::try_from(value)
        .map_err(|_| DatabaseError::SerializationError(format!("{field} is negative: {value}")))
}

fn to_i32(value: u32, field: &str) -> Result<i32, DatabaseError> {
    i32::try_from(value)
        .map_err(|_| DatabaseError::ConstraintViolation(format!("{field} is too large: {value}")))
}

fn to_i64(value: u64) -> Result<i64, DatabaseError> {
    i64::try_from(value)
        .map_err(|_| DatabaseError::ConstraintViolation(format!("version is too large: {value}")))
}

/// Text form of a unit enum, as serde names it
fn enum_text<T: Serialize>(value: &T) -> Result<String, DatabaseError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(text) => Ok(text),
        other => Err(DatabaseError::SerializationError(format!(
            "expected a unit variant, got {other}"
        ))),
    }
}

fn parse_enum<T: DeserializeOwned>(text: &str) -> Result<T, DatabaseError> {
    Ok(serde_json::from_value(serde_json::Value::String(text.to_string()))?)
}

fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|term| !term.is_empty())
}

/// `%term%` with LIKE wildcards in `term` escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, limit: Option<u32>, offset: Option<u32>) {
    if let Some(limit) = limit {
        builder.push(" LIMIT ").push_bind(i64::from(limit));
    }
    if let Some(offset) = offset {
        builder.push(" OFFSET ").push_bind(i64::from(offset));
    }
}

fn table_for(kind: SequenceKind) -> &'static str {
    match kind {
        SequenceKind::Patient => "patients",
        SequenceKind::Medicine => "medicines",
        SequenceKind::Service => "services",
        SequenceKind::Bill => "bills",
    }
}

// =============================================================================
// Query filters
// =============================================================================

fn patient_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PatientQuery) -> Result<(), DatabaseError> {
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(enum_text(&status)?);
    }
    if let Some(from) = query.created_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = query.created_to {
        builder.push(" AND created_at < ").push_bind(to);
    }
    if let Some(term) = search_term(query.search.as_deref()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone LIKE ")
            .push_bind(pattern.clone())
            .push(" OR code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    Ok(())
}

fn medicine_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &MedicineQuery) {
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category) = &query.category {
        builder
            .push(" AND lower(category) = lower(")
            .push_bind(category.trim().to_string())
            .push(")");
    }
    if let Some(term) = search_term(query.search.as_deref()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR generic_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn service_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ServiceQuery) {
    if !query.include_inactive {
        builder.push(" AND is_active");
    }
    if let Some(category) = &query.category {
        builder
            .push(" AND lower(category) = lower(")
            .push_bind(category.trim().to_string())
            .push(")");
    }
    if let Some(term) = search_term(query.search.as_deref()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn bill_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BillQuery) {
    if let Some(from) = query.from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        builder.push(" AND created_at < ").push_bind(to);
    }
    if let Some(patient) = query.patient {
        builder.push(" AND patient_id = ").push_bind(*patient.as_uuid());
    }
    if let Some(status) = query.payment_status {
        builder.push(" AND payment_status = ").push_bind(status.as_str());
    }
    if let Some(term) = search_term(query.search.as_deref()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR patient_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR patient_phone LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

// =============================================================================
// Guarded medicine writes
// =============================================================================

/// Writes `medicine` if the stored version is still `expected_version`
///
/// Returns the stored row with its bumped version, or `None` when the
/// medicine is gone or its version moved.
async fn write_medicine<'e, E>(
    executor: E,
    medicine: &Medicine,
    expected_version: u64,
) -> Result<Option<MedicineRow>, DatabaseError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "UPDATE medicines SET name = $3, generic_name = $4, category = $5, manufacturer = $6, \
         batch_number = $7, description = $8, currency = $9, buying_price = $10, \
         selling_price = $11, stock = $12, min_stock_level = $13, expiry_date = $14, \
         status = $15, updated_at = $16, version = version + 1 \
         WHERE id = $1 AND version = $2 \
         RETURNING {MEDICINE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, MedicineRow>(&sql)
        .bind(*medicine.id.as_uuid())
        .bind(to_i64(expected_version)?)
        .bind(&medicine.name)
        .bind(&medicine.generic_name)
        .bind(&medicine.category)
        .bind(&medicine.manufacturer)
        .bind(&medicine.batch_number)
        .bind(&medicine.description)
        .bind(medicine.selling_price.currency().code())
        .bind(medicine.buying_price.amount())
        .bind(medicine.selling_price.amount())
        .bind(to_i32(medicine.stock, "stock")?)
        .bind(to_i32(medicine.min_stock_level, "min_stock_level")?)
        .bind(medicine.expiry_date)
        .bind(medicine.status.as_str())
        .bind(medicine.updated_at)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

async fn medicine_exists<'e, E>(executor: E, id: MedicineId) -> Result<bool, DatabaseError>
where
    E: Executor<'e, Database = Postgres>,
{
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM medicines WHERE id = $1)")
        .bind(*id.as_uuid())
        .fetch_one(executor)
        .await?;
    Ok(exists)
}

fn stale(write: &MedicineWrite) -> PortError {
    PortError::conflict(format!(
        "medicine {} moved past version {}",
        write.medicine.code, write.expected_version
    ))
}

// =============================================================================
// Port implementations
// =============================================================================

#[async_trait]
impl SequencePort for PgStore {
    #[instrument(skip(self))]
    async fn next_value(&self, kind: SequenceKind) -> Result<u64, PortError> {
        let key = kind.to_string();
        let bumped = sqlx::query_scalar::<_, i64>(
            "UPDATE sequences SET value = value + 1 WHERE kind = $1 RETURNING value",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        let value = match bumped {
            Some(value) => value,
            None => {
                // First use of this kind: start after the highest stored code
                let sql = format!(
                    "INSERT INTO sequences (kind, value) \
                     SELECT $1, COALESCE(MAX(substring(code FROM $2)::BIGINT), 0) + 1 FROM {} \
                     ON CONFLICT (kind) DO UPDATE SET value = sequences.value + 1 \
                     RETURNING value",
                    table_for(kind)
                );
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(key.as_str())
                    .bind(format!("^{}([0-9]+)$", kind.prefix()))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db)?
            }
        };
        debug!(%kind, value, "sequence advanced");
        u64::try_from(value).map_err(|_| PortError::Transformation {
            message: format!("sequence {kind} is negative"),
        })
    }
}

#[async_trait]
impl PatientPort for PgStore {
    async fn get_patient(&self, id: PatientId) -> Result<Patient, PortError> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1");
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| PortError::not_found("patient", id))?;
        Ok(Patient::try_from(row)?)
    }

    async fn get_patient_by_code(&self, code: &str) -> Result<Patient, PortError> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE code = $1");
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| PortError::not_found("patient", code))?;
        Ok(Patient::try_from(row)?)
    }

    async fn find_patients(&self, query: &PatientQuery) -> Result<Vec<Patient>, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE TRUE"));
        patient_filters(&mut builder, query)?;
        builder.push(format!(" ORDER BY created_at DESC, {CODE_NUMBER} DESC"));
        push_page(&mut builder, query.limit, query.offset);

        let rows = builder
            .build_query_as::<PatientRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        rows.into_iter()
            .map(|row| Patient::try_from(row).map_err(PortError::from))
            .collect()
    }

    async fn count_patients(&self, query: &PatientQuery) -> Result<u64, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM patients WHERE TRUE");
        patient_filters(&mut builder, query)?;
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self, patient), fields(code = %patient.code))]
    async fn insert_patient(&self, patient: &Patient) -> Result<(), PortError> {
        sqlx::query(&format!(
            "INSERT INTO patients ({PATIENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        ))
        .bind(*patient.id.as_uuid())
        .bind(&patient.code)
        .bind(&patient.name)
        .bind(to_i32(patient.age, "age")?)
        .bind(enum_text(&patient.gender)?)
        .bind(&patient.phone)
        .bind(&patient.email)
        .bind(&patient.address)
        .bind(&patient.blood_group)
        .bind(Json(&patient.medical_history))
        .bind(Json(&patient.allergies))
        .bind(enum_text(&patient.status)?)
        .bind(patient.last_visit)
        .bind(Json(&patient.visits))
        .bind(patient.created_at)
        .bind(patient.updated_at)
        .execute(&self.pool)
        .await
        .map_err(duplicate_code("patient", &patient.code))?;
        Ok(())
    }

    async fn update_patient(&self, patient: &Patient) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE patients SET name = $2, age = $3, gender = $4, phone = $5, email = $6, \
             address = $7, blood_group = $8, medical_history = $9, allergies = $10, \
             status = $11, updated_at = $12 \
             WHERE id = $1",
        )
        .bind(*patient.id.as_uuid())
        .bind(&patient.name)
        .bind(to_i32(patient.age, "age")?)
        .bind(enum_text(&patient.gender)?)
        .bind(&patient.phone)
        .bind(&patient.email)
        .bind(&patient.address)
        .bind(&patient.blood_group)
        .bind(Json(&patient.medical_history))
        .bind(Json(&patient.allergies))
        .bind(enum_text(&patient.status)?)
        .bind(patient.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("patient", patient.id));
        }
        Ok(())
    }

    #[instrument(skip(self, visit), fields(patient = %id))]
    async fn append_visit(&self, id: PatientId, visit: Visit) -> Result<Patient, PortError> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db)?
            .ok_or_else(|| PortError::not_found("patient", id))?;
        let mut patient = Patient::try_from(row)?;
        patient.push_visit(visit, Utc::now());

        sqlx::query(
            "UPDATE patients SET visits = $2, last_visit = $3, status = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .bind(Json(&patient.visits))
        .bind(patient.last_visit)
        .bind(enum_text(&patient.status)?)
        .bind(patient.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        tx.commit().await.map_err(db)?;
        Ok(patient)
    }

    async fn delete_patient(&self, id: PatientId) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("patient", id));
        }
        Ok(())
    }
}

#[async_trait]
impl MedicinePort for PgStore {
    async fn get_medicine(&self, id: MedicineId) -> Result<Medicine, PortError> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = $1");
        let row = sqlx::query_as::<_, MedicineRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| PortError::not_found("medicine", id))?;
        Ok(Medicine::try_from(row)?)
    }

    async fn get_medicine_by_code(&self, code: &str) -> Result<Medicine, PortError> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE code = $1");
        let row = sqlx::query_as::<_, MedicineRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| PortError::not_found("medicine", code))?;
        Ok(Medicine::try_from(row)?)
    }

    async fn find_medicines(&self, query: &MedicineQuery) -> Result<Vec<Medicine>, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE TRUE"));
        medicine_filters(&mut builder, query);
        builder.push(format!(" ORDER BY lower(name), {CODE_NUMBER}"));
        push_page(&mut builder, query.limit, query.offset);

        let rows = builder
            .build_query_as::<MedicineRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        rows.into_iter()
            .map(|row| Medicine::try_from(row).map_err(PortError::from))
            .collect()
    }

    async fn count_medicines(&self, query: &MedicineQuery) -> Result<u64, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM medicines WHERE TRUE");
        medicine_filters(&mut builder, query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self, medicine), fields(code = %medicine.code))]
    async fn insert_medicine(&self, medicine: &Medicine) -> Result<(), PortError> {
        sqlx::query(&format!(
            "INSERT INTO medicines ({MEDICINE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)"
        ))
        .bind(*medicine.id.as_uuid())
        .bind(&medicine.code)
        .bind(&medicine.name)
        .bind(&medicine.generic_name)
        .bind(&medicine.category)
        .bind(&medicine.manufacturer)
        .bind(&medicine.batch_number)
        .bind(&medicine.description)
        .bind(medicine.selling_price.currency().code())
        .bind(medicine.buying_price.amount())
        .bind(medicine.selling_price.amount())
        .bind(to_i32(medicine.stock, "stock")?)
        .bind(to_i32(medicine.min_stock_level, "min_stock_level")?)
        .bind(medicine.expiry_date)
        .bind(medicine.status.as_str())
        .bind(to_i64(medicine.version)?)
        .bind(medicine.created_at)
        .bind(medicine.updated_at)
        .execute(&self.pool)
        .await
        .map_err(duplicate_code("medicine", &medicine.code))?;
        Ok(())
    }

    #[instrument(skip(self, medicine), fields(code = %medicine.code))]
    async fn replace_medicine(&self, medicine: &Medicine, expected_version: u64) -> Result<Medicine, PortError> {
        if let Some(row) = write_medicine(&self.pool, medicine, expected_version).await? {
            return Ok(Medicine::try_from(row)?);
        }
        if medicine_exists(&self.pool, medicine.id).await? {
            return Err(PortError::conflict(format!(
                "medicine {} moved past version {expected_version}",
                medicine.code
            )));
        }
        Err(PortError::not_found("medicine", medicine.id))
    }

    async fn delete_medicine(&self, id: MedicineId) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("medicine", id));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogPort for PgStore {
    async fn get_service(&self, id: ServiceId) -> Result<ServiceItem, PortError> {
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1");
        let row = sqlx::query_as::<_, ServiceRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| PortError::not_found("service", id))?;
        Ok(ServiceItem::try_from(row)?)
    }

    async fn get_service_by_code(&self, code: &str) -> Result<ServiceItem, PortError> {
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE code = $1");
        let row = sqlx::query_as::<_, ServiceRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| PortError::not_found("service", code))?;
        Ok(ServiceItem::try_from(row)?)
    }

    async fn find_services(&self, query: &ServiceQuery) -> Result<Vec<ServiceItem>, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {SERVICE_COLUMNS} FROM services WHERE TRUE"));
        service_filters(&mut builder, query);
        builder.push(format!(" ORDER BY lower(name), {CODE_NUMBER}"));

        let rows = builder
            .build_query_as::<ServiceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        rows.into_iter()
            .map(|row| ServiceItem::try_from(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, service), fields(code = %service.code))]
    async fn insert_service(&self, service: &ServiceItem) -> Result<(), PortError> {
        sqlx::query(&format!(
            "INSERT INTO services ({SERVICE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(*service.id.as_uuid())
        .bind(&service.code)
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.category)
        .bind(service.price.currency().code())
        .bind(service.price.amount())
        .bind(&service.duration)
        .bind(service.is_active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await
        .map_err(duplicate_code("service", &service.code))?;
        Ok(())
    }

    async fn update_service(&self, service: &ServiceItem) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE services SET name = $2, description = $3, category = $4, currency = $5, \
             price = $6, duration = $7, is_active = $8, updated_at = $9 \
             WHERE id = $1",
        )
        .bind(*service.id.as_uuid())
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.category)
        .bind(service.price.currency().code())
        .bind(service.price.amount())
        .bind(&service.duration)
        .bind(service.is_active)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("service", service.id));
        }
        Ok(())
    }
}

#[async_trait]
impl BillPort for PgStore {
    async fn get_bill(&self, id: BillId) -> Result<Bill, PortError> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1");
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| PortError::not_found("bill", id))?;
        Ok(Bill::try_from(row)?)
    }

    async fn get_bill_by_code(&self, code: &str) -> Result<Bill, PortError> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE code = $1");
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| PortError::not_found("bill", code))?;
        Ok(Bill::try_from(row)?)
    }

    async fn find_bills(&self, query: &BillQuery) -> Result<Vec<Bill>, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {BILL_COLUMNS} FROM bills WHERE TRUE"));
        bill_filters(&mut builder, query);
        builder.push(format!(" ORDER BY created_at DESC, {CODE_NUMBER} DESC"));
        push_page(&mut builder, query.limit, query.offset);

        let rows = builder
            .build_query_as::<BillRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        rows.into_iter()
            .map(|row| Bill::try_from(row).map_err(PortError::from))
            .collect()
    }

    async fn count_bills(&self, query: &BillQuery) -> Result<u64, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM bills WHERE TRUE");
        bill_filters(&mut builder, query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self, commit), fields(code = %commit.bill.code))]
    async fn commit_bill(&self, commit: &BillCommit) -> Result<(), PortError> {
        let bill = &commit.bill;
        let mut tx = self.pool.begin().await.map_err(db)?;

        sqlx::query(&format!(
            "INSERT INTO bills ({BILL_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        ))
        .bind(*bill.id.as_uuid())
        .bind(&bill.code)
        .bind(*bill.patient.as_uuid())
        .bind(&bill.patient_name)
        .bind(&bill.patient_phone)
        .bind(bill.currency().code())
        .bind(bill.consultation_fee.amount())
        .bind(Json(&bill.medicines))
        .bind(Json(&bill.services))
        .bind(bill.medicines_total.amount())
        .bind(bill.services_total.amount())
        .bind(bill.total_amount.amount())
        .bind(bill.payment_status.as_str())
        .bind(bill.payment_method.map(|method| method.as_str()))
        .bind(&bill.notes)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(duplicate_code("bill", &bill.code))?;

        for write in &commit.medicines {
            if write_medicine(&mut *tx, &write.medicine, write.expected_version).await?.is_none() {
                return Err(if medicine_exists(&mut *tx, write.medicine.id).await? {
                    stale(write)
                } else {
                    PortError::not_found("medicine", write.medicine.id)
                });
            }
        }

        let touched = sqlx::query(
            "UPDATE patients SET last_visit = GREATEST(last_visit, $2) WHERE id = $1",
        )
        .bind(*commit.patient().as_uuid())
        .bind(commit.visited_at())
        .execute(&mut *tx)
        .await
        .map_err(db)?;
        if touched.rows_affected() == 0 {
            return Err(PortError::not_found("patient", commit.patient()));
        }

        tx.commit().await.map_err(db)?;
        debug!(medicines = commit.medicines.len(), "bill committed");
        Ok(())
    }

    async fn update_bill(&self, bill: &Bill) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE bills SET payment_status = $2, payment_method = $3, notes = $4, \
             medicines_total = $5, services_total = $6, total_amount = $7, updated_at = $8 \
             WHERE id = $1",
        )
        .bind(*bill.id.as_uuid())
        .bind(bill.payment_status.as_str())
        .bind(bill.payment_method.map(|method| method.as_str()))
        .bind(&bill.notes)
        .bind(bill.medicines_total.amount())
        .bind(bill.services_total.amount())
        .bind(bill.total_amount.amount())
        .bind(bill.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("bill", bill.id));
        }
        Ok(())
    }

    #[instrument(skip(self, deletion), fields(bill = %deletion.bill))]
    async fn commit_deletion(&self, deletion: &BillDeletion) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        let removed = sqlx::query("DELETE FROM bills WHERE id = $1")
            .bind(*deletion.bill.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        if removed.rows_affected() == 0 {
            return Err(PortError::not_found("bill", deletion.bill));
        }

        for write in &deletion.medicines {
            if write_medicine(&mut *tx, &write.medicine, write.expected_version).await?.is_none() {
                return Err(stale(write));
            }
        }

        tx.commit().await.map_err(db)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_patient::{Gender, PatientStatus};

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ravi"), "%ravi%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_enum_text_matches_wire_names() {
        assert_eq!(enum_text(&Gender::Female).unwrap(), "female");
        assert_eq!(enum_text(&PatientStatus::Inactive).unwrap(), "Inactive");
        let status: PatientStatus = parse_enum("Active").unwrap();
        assert_eq!(status, PatientStatus::Active);
        assert!(parse_enum::<Gender>("unknown").is_err());
    }

    #[test]
    fn test_search_term_ignores_blank() {
        assert_eq!(search_term(Some("  ")), None);
        assert_eq!(search_term(Some(" DOC001 ")), Some("DOC001"));
        assert_eq!(search_term(None), None);
    }

    #[test]
    fn test_bill_row_converts_to_bill() {
        let now = Utc::now();
        let row = BillRow {
            id: Uuid::new_v4(),
            code: "BILL007".to_string(),
            patient_id: Uuid::new_v4(),
            patient_name: "Asha".to_string(),
            patient_phone: "9876543210".to_string(),
            currency: "INR".to_string(),
            consultation_fee: Decimal::new(500, 0),
            medicines: Json(Vec::new()),
            services: Json(Vec::new()),
            medicines_total: Decimal::ZERO,
            services_total: Decimal::ZERO,
            total_amount: Decimal::new(500, 0),
            payment_status: "partial".to_string(),
            payment_method: Some("upi".to_string()),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let bill = Bill::try_from(row).unwrap();
        assert_eq!(bill.currency(), Currency::INR);
        assert_eq!(bill.payment_status, PaymentStatus::Partial);
        assert_eq!(bill.payment_method, Some(PaymentMethod::Upi));
        assert_eq!(bill.total_amount.amount(), Decimal::new(500, 0));
    }

    #[test]
    fn test_negative_stock_row_is_rejected() {
        assert!(to_u32(-1, "stock").is_err());
        assert_eq!(to_u32(7, "stock").unwrap(), 7);
    }
}
