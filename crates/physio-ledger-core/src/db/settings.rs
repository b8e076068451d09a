//! Business settings (single row).

use rusqlite::params;

use super::{Database, DbResult};
use crate::models::BusinessSettings;

impl Database {
    /// Current business settings.
    pub fn get_settings(&self) -> DbResult<BusinessSettings> {
        self.conn
            .query_row(
                r#"
                SELECT clinic_name, address, phone, email, currency_symbol,
                       invoice_footer, updated_at
                FROM business_settings
                WHERE id = 1
                "#,
                [],
                |row| {
                    Ok(BusinessSettings {
                        clinic_name: row.get(0)?,
                        address: row.get(1)?,
                        phone: row.get(2)?,
                        email: row.get(3)?,
                        currency_symbol: row.get(4)?,
                        invoice_footer: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    /// Replace the business settings.
    pub fn update_settings(&self, settings: &BusinessSettings) -> DbResult<()> {
        self.conn.execute(
            r#"
            UPDATE business_settings SET
                clinic_name = ?1,
                address = ?2,
                phone = ?3,
                email = ?4,
                currency_symbol = ?5,
                invoice_footer = ?6,
                updated_at = datetime('now')
            WHERE id = 1
            "#,
            params![
                settings.clinic_name,
                settings.address,
                settings.phone,
                settings.email,
                settings.currency_symbol,
                settings.invoice_footer,
            ],
        )?;
        Ok(())
    }
}
