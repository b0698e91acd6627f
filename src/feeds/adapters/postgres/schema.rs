//! Diesel schema for feeds persistence.

diesel::table! {
    /// Registered feeds managers.
    feeds_managers (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Feeds manager endpoint.
        uri -> Text,
        /// Display name.
        name -> Text,
        /// 32-byte message authentication key.
        public_key -> Bytea,
        /// Permitted job types, in the order supplied.
        job_types -> Array<Text>,
        /// Network name.
        network -> Text,
        /// Off-chain reporting bootstrap peer flag.
        is_ocr_bootstrap_peer -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Job proposals submitted by feeds managers.
    job_proposals (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Identifier assigned by the remote feeds manager.
        remote_uuid -> Uuid,
        /// Serialized job definition.
        spec -> Text,
        /// Status code (0 pending, 1 approved, 2 rejected, 3 cancelled).
        status -> Int2,
        /// Linked local job, set on approval.
        job_id -> Nullable<Int8>,
        /// Owning feeds manager.
        feeds_manager_id -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(job_proposals -> feeds_managers (feeds_manager_id));
diesel::allow_tables_to_appear_in_same_query!(feeds_managers, job_proposals);
