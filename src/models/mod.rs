pub mod article;
pub mod article_like;
pub mod category;
pub mod comment;
pub mod course;
pub mod donation;
pub mod enrollment;
pub mod lecture;
pub mod section;
pub mod user;

pub use article::{Entity as Article, Model as ArticleModel};
pub use article_like::Entity as ArticleLike;
pub use category::{Entity as Category, Model as CategoryModel};
pub use comment::{Entity as Comment, Model as CommentModel};
pub use course::{Entity as Course, Model as CourseModel};
pub use donation::{Entity as Donation, Model as DonationModel};
pub use enrollment::{Entity as Enrollment, Model as EnrollmentModel};
pub use lecture::{Entity as Lecture, Model as LectureModel};
pub use section::{Entity as Section, Model as SectionModel};
pub use user::{Entity as User, Model as UserModel};
