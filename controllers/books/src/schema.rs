table! {
    books (id) {
        id -> Int4,
        title -> Varchar,
        author -> Varchar,
    }
}

table! {
    reviews (id) {
        id -> Int4,
        book_id -> Int4,
        rating -> Int4,
        review_text -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

joinable!(reviews -> books (book_id));

allow_tables_to_appear_in_same_query!(
    books,
    reviews,
);
