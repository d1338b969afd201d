pub mod google_books;
pub mod igdb;
pub mod jikan;
pub mod library;
pub mod media;
pub mod tmdb;

pub use library::{
    ActivityEntry, LibraryEntry, LibraryFilter, LibraryStatus, MediaSnapshot, Review,
};
pub use media::{
    CastMember, MediaItem, MediaSlug, MediaTag, MediaType, Source, Video, WatchKind,
    WatchProvider,
};
